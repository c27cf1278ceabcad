use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};

use async_trait::async_trait;
use chrono::{Datelike, NaiveDate, NaiveDateTime, TimeDelta};
use dailynote_models::{
    alarm::{Alarm, AlarmTime, DueAlarm},
    fixed_note::FixedNote,
    note::NoteId,
    recurrence::{RecurrenceRule, WeekdaySet},
};
use dailynote_storage::{InMemoryStore, NewFixedNote, NewNote, NoteStore, StorageError};
use proptest::prelude::*;
use test_strategy::proptest;

use super::*;
use crate::ManualClock;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn at(day: NaiveDate, h: u32, m: u32, s: u32) -> NaiveDateTime {
    day.and_hms_opt(h, m, s).unwrap()
}

fn hm(h: u32, m: u32) -> AlarmTime {
    AlarmTime::from_hm(h, m).unwrap()
}

fn every_day() -> RecurrenceRule {
    RecurrenceRule::weekly(WeekdaySet::from_numbers(0..7).unwrap())
}

fn manual_settings() -> EngineSettings {
    EngineSettings {
        auto_dismiss: false,
        ..EngineSettings::default()
    }
}

const JUNE_1: (i32, u32, u32) = (2024, 6, 1);

struct TestContext {
    store: Arc<InMemoryStore>,
    clock: ManualClock,
    engine: AlarmEngine,
}

impl TestContext {
    fn new() -> Self {
        Self::with_settings(EngineSettings::default())
    }

    fn with_settings(settings: EngineSettings) -> Self {
        let store = Arc::new(InMemoryStore::new());
        let (y, m, d) = JUNE_1;
        let clock = ManualClock::new(at(date(y, m, d), 0, 0, 0));
        let engine = AlarmEngine::new(store.clone(), clock.clone(), settings);

        Self {
            store,
            clock,
            engine,
        }
    }

    async fn tick_at(&mut self, now: NaiveDateTime) -> Vec<FireEvent> {
        self.clock.set(now);
        self.engine.tick().await.unwrap().fired
    }

    async fn one_time_alarm(&self, day: NaiveDate, time: AlarmTime) -> NoteId {
        let note = self
            .store
            .insert_note(NewNote {
                title: "Dentist".to_owned(),
                content: "Bring card".to_owned(),
                date: day,
            })
            .await
            .unwrap();
        self.store
            .save_alarm(Alarm::new(note.id, None, 80, 10, time).unwrap())
            .await
            .unwrap();
        note.id
    }

    async fn fixed_note(&self, rule: RecurrenceRule, time: Option<AlarmTime>) -> FixedNote {
        self.store
            .insert_fixed_note(NewFixedNote {
                title: "Gym".to_owned(),
                content: "Legs".to_owned(),
                alarm_enabled: true,
                time,
                rule,
            })
            .await
            .unwrap()
    }

    async fn alarm_of(&self, note_id: NoteId) -> Option<Alarm> {
        self.store.get_alarm(note_id).await.unwrap()
    }
}

fn identities(events: &[FireEvent]) -> Vec<AlarmIdentity> {
    events.iter().map(|e| e.identity).collect()
}

#[tokio::test]
async fn one_time_note_fires_once_and_dismiss_removes_its_alarm() {
    let mut ctx = TestContext::with_settings(manual_settings());
    let june_1 = date(2024, 6, 1);
    let id = ctx.one_time_alarm(june_1, hm(9, 0)).await;
    assert_eq!(id, 1);

    let fired = ctx.tick_at(at(june_1, 9, 0, 0)).await;
    assert_eq!(
        fired,
        vec![FireEvent {
            identity: AlarmIdentity::OneTime(1),
            title: "Dentist".to_owned(),
            body: "Bring card".to_owned(),
            sound: None,
            volume: 80,
            duration_secs: 10,
        }]
    );
    assert!(ctx.tick_at(at(june_1, 9, 1, 0)).await.is_empty());

    let outcome = ctx.engine.dismiss(AlarmIdentity::OneTime(1)).await.unwrap();

    assert_eq!(outcome, ResponseOutcome::Dismissed);
    assert_eq!(ctx.alarm_of(1).await, None);
    assert!(ctx.store.get_note(1).await.unwrap().is_some());
    assert!(ctx.tick_at(at(date(2024, 6, 2), 9, 0, 0)).await.is_empty());
}

#[tokio::test]
async fn repeated_ticks_in_one_minute_fire_once() {
    let mut ctx = TestContext::with_settings(manual_settings());
    let june_1 = date(2024, 6, 1);
    ctx.one_time_alarm(june_1, hm(9, 0)).await;
    ctx.fixed_note(every_day(), Some(hm(9, 0))).await;

    let first = ctx.tick_at(at(june_1, 9, 0, 0)).await;
    let second = ctx.tick_at(at(june_1, 9, 0, 1)).await;
    let third = ctx.tick_at(at(june_1, 9, 0, 59)).await;

    assert_eq!(
        identities(&first),
        vec![AlarmIdentity::OneTime(1), AlarmIdentity::Recurring(1)]
    );
    assert!(second.is_empty());
    assert!(third.is_empty());
}

#[tokio::test]
async fn dismissed_recurring_note_waits_for_its_next_occurrence() {
    let mut ctx = TestContext::with_settings(manual_settings());
    let note = ctx.fixed_note(every_day(), Some(hm(8, 0))).await;
    let identity = AlarmIdentity::Recurring(note.id);
    let june_1 = date(2024, 6, 1);

    assert_eq!(identities(&ctx.tick_at(at(june_1, 8, 0, 0)).await), vec![identity]);
    assert_eq!(
        ctx.engine.dismiss(identity).await.unwrap(),
        ResponseOutcome::Dismissed
    );
    assert!(ctx.tick_at(at(june_1, 8, 0, 20)).await.is_empty());

    assert_eq!(
        identities(&ctx.tick_at(at(date(2024, 6, 2), 8, 0, 0)).await),
        vec![identity]
    );
    assert_eq!(ctx.store.load_fixed_notes().await.unwrap(), vec![note]);
}

#[tokio::test]
async fn snooze_moves_alarm_and_fires_again() {
    let mut ctx = TestContext::with_settings(manual_settings());
    let june_1 = date(2024, 6, 1);
    let id = ctx.one_time_alarm(june_1, hm(10, 0)).await;
    let identity = AlarmIdentity::OneTime(id);
    ctx.tick_at(at(june_1, 10, 0, 0)).await;

    let outcome = ctx.engine.snooze(identity, 15).await.unwrap();

    assert_eq!(outcome, ResponseOutcome::Snoozed { until: hm(10, 15) });
    assert_eq!(ctx.alarm_of(id).await.unwrap().time, hm(10, 15));
    assert!(!ctx.engine.ledger().contains(&identity));
    assert!(ctx.tick_at(at(june_1, 10, 14, 0)).await.is_empty());
    assert_eq!(identities(&ctx.tick_at(at(june_1, 10, 15, 0)).await), vec![identity]);
}

#[tokio::test]
async fn snooze_past_midnight_keeps_the_note_date() {
    let mut ctx = TestContext::with_settings(manual_settings());
    let june_1 = date(2024, 6, 1);
    let id = ctx.one_time_alarm(june_1, hm(23, 50)).await;
    ctx.tick_at(at(june_1, 23, 50, 0)).await;

    let outcome = ctx.engine.snooze(AlarmIdentity::OneTime(id), 15).await.unwrap();

    assert_eq!(outcome, ResponseOutcome::Snoozed { until: hm(0, 5) });
    assert_eq!(ctx.store.get_note(id).await.unwrap().unwrap().date, june_1);
    assert!(ctx.tick_at(at(date(2024, 6, 2), 0, 5, 0)).await.is_empty());
}

#[tokio::test]
async fn zero_minute_snooze_only_clears_the_entry() {
    let mut ctx = TestContext::with_settings(manual_settings());
    let june_1 = date(2024, 6, 1);
    let id = ctx.one_time_alarm(june_1, hm(9, 0)).await;
    ctx.tick_at(at(june_1, 9, 0, 0)).await;

    let outcome = ctx.engine.snooze(AlarmIdentity::OneTime(id), 0).await.unwrap();

    assert_eq!(outcome, ResponseOutcome::Cleared);
    assert_eq!(ctx.alarm_of(id).await.unwrap().time, hm(9, 0));
    assert!(ctx.engine.ledger().is_empty());
    assert!(ctx.tick_at(at(june_1, 9, 0, 30)).await.is_empty());
}

#[tokio::test]
async fn snoozing_after_the_note_was_deleted_only_clears_the_entry() {
    let mut ctx = TestContext::with_settings(manual_settings());
    let june_1 = date(2024, 6, 1);
    let id = ctx.one_time_alarm(june_1, hm(9, 0)).await;
    ctx.tick_at(at(june_1, 9, 0, 0)).await;
    ctx.store.delete_note(id).await.unwrap();

    let outcome = ctx.engine.snooze(AlarmIdentity::OneTime(id), 5).await.unwrap();

    assert_eq!(outcome, ResponseOutcome::Cleared);
    assert!(ctx.engine.ledger().is_empty());
    assert!(ctx.store.list_alarms().await.unwrap().is_empty());
    assert!(ctx.tick_at(at(june_1, 9, 5, 0)).await.is_empty());
}

#[tokio::test]
async fn snoozing_a_fixed_note_leaves_it_untouched() {
    let mut ctx = TestContext::with_settings(manual_settings());
    let note = ctx.fixed_note(every_day(), Some(hm(8, 0))).await;
    let june_1 = date(2024, 6, 1);
    ctx.tick_at(at(june_1, 8, 0, 0)).await;

    let outcome = ctx
        .engine
        .snooze(AlarmIdentity::Recurring(note.id), 10)
        .await
        .unwrap();

    assert_eq!(outcome, ResponseOutcome::Cleared);
    assert!(ctx.engine.ledger().is_empty());
    assert_eq!(ctx.store.load_fixed_notes().await.unwrap(), vec![note]);
    assert!(ctx.tick_at(at(june_1, 8, 10, 0)).await.is_empty());
}

#[tokio::test]
async fn responses_to_identities_that_are_not_ringing_are_ignored() {
    let mut ctx = TestContext::with_settings(manual_settings());
    let june_1 = date(2024, 6, 1);
    let id = ctx.one_time_alarm(june_1, hm(9, 0)).await;
    let identity = AlarmIdentity::OneTime(id);

    assert_eq!(ctx.engine.dismiss(identity).await.unwrap(), ResponseOutcome::Ignored);
    assert_eq!(ctx.engine.snooze(identity, 5).await.unwrap(), ResponseOutcome::Ignored);
    assert_eq!(ctx.engine.release(identity), ResponseOutcome::Ignored);
    assert_eq!(ctx.alarm_of(id).await.unwrap().time, hm(9, 0));

    ctx.tick_at(at(june_1, 9, 0, 0)).await;
    assert_eq!(ctx.engine.dismiss(identity).await.unwrap(), ResponseOutcome::Dismissed);
    assert_eq!(ctx.engine.dismiss(identity).await.unwrap(), ResponseOutcome::Ignored);
}

#[tokio::test]
async fn releasing_keeps_the_alarm_stored() {
    let mut ctx = TestContext::with_settings(manual_settings());
    let june_1 = date(2024, 6, 1);
    let id = ctx.one_time_alarm(june_1, hm(9, 0)).await;
    ctx.tick_at(at(june_1, 9, 0, 0)).await;

    assert_eq!(
        ctx.engine.release(AlarmIdentity::OneTime(id)),
        ResponseOutcome::Cleared
    );
    assert!(ctx.alarm_of(id).await.is_some());
    assert!(ctx.tick_at(at(june_1, 9, 0, 40)).await.is_empty());
}

#[tokio::test]
async fn unanswered_alarms_are_dismissed_after_their_ring_duration() {
    let mut ctx = TestContext::new();
    let june_1 = date(2024, 6, 1);
    let id = ctx.one_time_alarm(june_1, hm(9, 0)).await;
    let note = ctx.fixed_note(every_day(), Some(hm(9, 0))).await;
    ctx.tick_at(at(june_1, 9, 0, 0)).await;

    ctx.clock.set(at(june_1, 9, 0, 9));
    assert!(ctx.engine.tick().await.unwrap().timed_out.is_empty());

    ctx.clock.set(at(june_1, 9, 0, 10));
    let report = ctx.engine.tick().await.unwrap();

    assert_eq!(
        report,
        TickReport {
            timed_out: vec![AlarmIdentity::OneTime(id), AlarmIdentity::Recurring(note.id)],
            fired: vec![],
        }
    );
    assert_eq!(ctx.alarm_of(id).await, None);
    assert!(ctx.engine.ledger().is_empty());
}

#[tokio::test]
async fn unanswered_fixed_note_stays_suppressed_without_auto_dismiss() {
    let mut ctx = TestContext::with_settings(manual_settings());
    ctx.fixed_note(
        RecurrenceRule::weekly(WeekdaySet::from_numbers([0, 2]).unwrap()),
        Some(hm(8, 0)),
    )
    .await;

    let monday = ctx.tick_at(at(date(2024, 6, 3), 8, 0, 0)).await;
    let wednesday = ctx.tick_at(at(date(2024, 6, 5), 8, 0, 0)).await;

    assert_eq!(monday.len(), 1);
    assert!(wednesday.is_empty());
}

#[tokio::test]
async fn injected_ledger_suppresses_what_is_already_ringing() {
    let store = Arc::new(InMemoryStore::new());
    let june_1 = date(2024, 6, 1);
    let note = store
        .insert_note(NewNote {
            title: "Call".to_owned(),
            content: String::new(),
            date: june_1,
        })
        .await
        .unwrap();
    store.upsert_alarm_time(note.id, hm(9, 0)).await.unwrap();
    let identity = AlarmIdentity::OneTime(note.id);
    let mut ledger = ActiveAlarmLedger::new();
    ledger.add(identity, at(june_1, 9, 0, 0), TimeDelta::minutes(5));
    let clock = ManualClock::new(at(june_1, 9, 0, 30));
    let mut engine =
        AlarmEngine::new(store.clone(), clock, manual_settings()).with_ledger(ledger);

    let report = engine.tick().await.unwrap();

    assert_eq!(report, TickReport::default());
    assert_eq!(engine.dismiss(identity).await.unwrap(), ResponseOutcome::Dismissed);
    assert_eq!(store.get_alarm(note.id).await.unwrap(), None);
}

#[tokio::test]
async fn weekly_single_day_fires_only_on_that_weekday() {
    let monday = date(2024, 6, 3);
    for day in 0..7u32 {
        let mut ctx = TestContext::new();
        ctx.fixed_note(
            RecurrenceRule::weekly(WeekdaySet::from_numbers([day]).unwrap()),
            Some(hm(8, 0)),
        )
        .await;

        let mut fired_on = Vec::new();
        for offset in 0..7 {
            let today = monday + TimeDelta::days(offset);
            for (h, m, s) in [(8, 0, 0), (8, 0, 30), (8, 1, 0)] {
                if !ctx.tick_at(at(today, h, m, s)).await.is_empty() {
                    fired_on.push(today.weekday().num_days_from_monday());
                }
            }
        }

        assert_eq!(
            fired_on,
            vec![day],
            "weekday {day}"
        );
    }
}

#[tokio::test]
async fn weekly_monday_wednesday_fires_twice_in_a_week() {
    let mut ctx = TestContext::new();
    for _ in 1..7 {
        let placeholder = ctx.fixed_note(every_day(), None).await;
        ctx.store.delete_fixed_note(placeholder.id).await.unwrap();
    }
    let note = ctx
        .fixed_note(
            RecurrenceRule::weekly(WeekdaySet::from_numbers([0, 2]).unwrap()),
            Some(hm(8, 0)),
        )
        .await;
    assert_eq!(note.id, 7);

    let start = at(date(2024, 6, 3), 0, 0, 0);
    let mut fired = Vec::new();
    let mut now = start;
    while now < start + TimeDelta::days(7) {
        for event in ctx.tick_at(now).await {
            fired.push((event.identity, now));
        }
        now += TimeDelta::seconds(30);
    }

    assert_eq!(
        fired,
        vec![
            (AlarmIdentity::Recurring(7), at(date(2024, 6, 3), 8, 0, 0)),
            (AlarmIdentity::Recurring(7), at(date(2024, 6, 5), 8, 0, 0)),
        ]
    );
}

#[tokio::test]
async fn monthly_31_skips_short_months() {
    let mut ctx = TestContext::new();
    ctx.fixed_note(RecurrenceRule::monthly(31).unwrap(), Some(hm(8, 0)))
        .await;

    let mut months = Vec::new();
    let mut today = date(2024, 1, 1);
    while today.year() == 2024 {
        if !ctx.tick_at(at(today, 8, 0, 0)).await.is_empty() {
            months.push(today.month());
        }
        today += TimeDelta::days(1);
    }

    assert_eq!(months, vec![1, 3, 5, 7, 8, 10, 12]);
}

#[tokio::test]
async fn events_are_ordered_one_time_first_then_by_id() {
    let mut ctx = TestContext::with_settings(manual_settings());
    let june_1 = date(2024, 6, 1);
    let first = ctx.one_time_alarm(june_1, hm(12, 0)).await;
    let second = ctx.one_time_alarm(june_1, hm(12, 0)).await;
    let removed = ctx.fixed_note(every_day(), Some(hm(12, 0))).await;
    let kept = ctx.fixed_note(every_day(), Some(hm(12, 0))).await;
    ctx.store.delete_fixed_note(removed.id).await.unwrap();
    let added = ctx.fixed_note(every_day(), Some(hm(12, 0))).await;

    let fired = ctx.tick_at(at(june_1, 12, 0, 0)).await;

    assert_eq!(
        identities(&fired),
        vec![
            AlarmIdentity::OneTime(first),
            AlarmIdentity::OneTime(second),
            AlarmIdentity::Recurring(kept.id),
            AlarmIdentity::Recurring(added.id),
        ]
    );
}

#[tokio::test]
async fn disabled_and_timeless_fixed_notes_never_fire() {
    let mut ctx = TestContext::new();
    let disabled = ctx.fixed_note(every_day(), Some(hm(8, 0))).await;
    ctx.store
        .set_fixed_alarm_enabled(disabled.id, false)
        .await
        .unwrap();
    ctx.fixed_note(every_day(), None).await;

    assert!(ctx.tick_at(at(date(2024, 6, 1), 8, 0, 0)).await.is_empty());
}

#[tokio::test]
async fn recurring_events_use_configured_sound_settings() {
    let settings = EngineSettings {
        recurring_alarm: RecurringAlarmSettings {
            sound: Some("chime.ogg".to_owned()),
            volume: 30,
            duration_secs: 45,
        },
        auto_dismiss: true,
    };
    let mut ctx = TestContext::with_settings(settings);
    ctx.fixed_note(every_day(), Some(hm(8, 0))).await;

    let fired = ctx.tick_at(at(date(2024, 6, 1), 8, 0, 0)).await;

    assert_eq!(fired[0].sound.as_deref(), Some("chime.ogg"));
    assert_eq!(fired[0].volume, 30);
    assert_eq!(fired[0].ring_duration(), TimeDelta::seconds(45));
}

struct FlakyStore {
    inner: InMemoryStore,
    failing: AtomicBool,
}

impl FlakyStore {
    fn check(&self) -> Result<(), StorageError> {
        if self.failing.load(Ordering::SeqCst) {
            Err(StorageError::Sqlx(sqlx::Error::PoolTimedOut))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl AlarmStore for FlakyStore {
    async fn load_due_alarms(&self, date: NaiveDate) -> Result<Vec<DueAlarm>, StorageError> {
        self.check()?;
        self.inner.load_due_alarms(date).await
    }

    async fn load_fixed_notes(&self) -> Result<Vec<FixedNote>, StorageError> {
        self.check()?;
        self.inner.load_fixed_notes().await
    }

    async fn delete_alarm(&self, note_id: NoteId) -> Result<(), StorageError> {
        self.check()?;
        self.inner.delete_alarm(note_id).await
    }

    async fn upsert_alarm_time(
        &self,
        note_id: NoteId,
        time: AlarmTime,
    ) -> Result<(), StorageError> {
        self.check()?;
        self.inner.upsert_alarm_time(note_id, time).await
    }
}

#[tokio::test]
async fn store_failure_is_transient() {
    let store = Arc::new(FlakyStore {
        inner: InMemoryStore::new(),
        failing: AtomicBool::new(true),
    });
    let june_1 = date(2024, 6, 1);
    let note = store
        .inner
        .insert_note(NewNote {
            title: "Call".to_owned(),
            content: String::new(),
            date: june_1,
        })
        .await
        .unwrap();
    store.inner.upsert_alarm_time(note.id, hm(9, 0)).await.unwrap();
    let clock = ManualClock::new(at(june_1, 9, 0, 0));
    let mut engine = AlarmEngine::new(store.clone(), clock.clone(), manual_settings());

    assert!(engine.tick().await.is_err());
    assert!(engine.ledger().is_empty());

    store.failing.store(false, Ordering::SeqCst);
    clock.set(at(june_1, 9, 0, 1));
    let report = engine.tick().await.unwrap();

    assert_eq!(identities(&report.fired), vec![AlarmIdentity::OneTime(note.id)]);
}

#[tokio::test]
async fn failed_dismiss_keeps_the_alarm_ringing() {
    let store = Arc::new(FlakyStore {
        inner: InMemoryStore::new(),
        failing: AtomicBool::new(false),
    });
    let june_1 = date(2024, 6, 1);
    let note = store
        .inner
        .insert_note(NewNote {
            title: "Call".to_owned(),
            content: String::new(),
            date: june_1,
        })
        .await
        .unwrap();
    store.inner.upsert_alarm_time(note.id, hm(9, 0)).await.unwrap();
    let clock = ManualClock::new(at(june_1, 9, 0, 0));
    let mut engine = AlarmEngine::new(store.clone(), clock, manual_settings());
    engine.tick().await.unwrap();

    store.failing.store(true, Ordering::SeqCst);
    assert!(engine.dismiss(AlarmIdentity::OneTime(note.id)).await.is_err());
    assert!(engine.ledger().contains(&AlarmIdentity::OneTime(note.id)));

    store.failing.store(false, Ordering::SeqCst);
    assert_eq!(
        engine.dismiss(AlarmIdentity::OneTime(note.id)).await.unwrap(),
        ResponseOutcome::Dismissed
    );
}

fn tokio_ct(future: impl Future<Output = Result<(), TestCaseError>>) -> Result<(), TestCaseError> {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap()
        .block_on(future)
}

#[proptest(async = tokio_ct)]
async fn due_minute_fires_exactly_once(
    #[strategy(0..24u32)] hours: u32,
    #[strategy(0..60u32)] minutes: u32,
) {
    let mut ctx = TestContext::new();
    ctx.fixed_note(every_day(), Some(hm(hours, minutes))).await;
    let due = at(date(2024, 6, 1), hours, minutes, 0);

    let mut fired = 0;
    let mut now = due - TimeDelta::minutes(1);
    while now < due + TimeDelta::minutes(2) {
        fired += ctx.tick_at(now).await.len();
        now += TimeDelta::seconds(1);
    }

    prop_assert_eq!(fired, 1);
}
