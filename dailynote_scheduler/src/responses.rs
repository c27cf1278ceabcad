use std::sync::Arc;

use chrono::{NaiveDateTime, TimeDelta};
use dailynote_models::{alarm::AlarmTime, identity::AlarmIdentity};
use dailynote_storage::{AlarmStore, StorageError};

use crate::ActiveAlarmLedger;

const MINUTES_PER_DAY: i64 = 24 * 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseOutcome {
    /// The identity was not ringing; nothing changed.
    Ignored,
    Dismissed,
    Snoozed { until: AlarmTime },
    /// Ledger entry cleared, storage untouched.
    Cleared,
}

/// Applies user decisions about ringing alarms to storage and the ledger.
pub struct ResponseHandler {
    store: Arc<dyn AlarmStore>,
}

impl ResponseHandler {
    pub fn new(store: Arc<dyn AlarmStore>) -> Self {
        Self { store }
    }

    /// One-time alarms lose their alarm row (the note stays). Fixed notes are
    /// left as they are and fire again on their next occurrence.
    pub async fn dismiss(
        &self,
        identity: AlarmIdentity,
        ledger: &mut ActiveAlarmLedger,
    ) -> anyhow::Result<ResponseOutcome> {
        if !ledger.contains(&identity) {
            log::debug!("Dismiss of {identity} ignored, it is not ringing");
            return Ok(ResponseOutcome::Ignored);
        }

        if let AlarmIdentity::OneTime(note_id) = identity {
            self.store.delete_alarm(note_id).await?;
        }
        ledger.remove(&identity);
        log::info!("[DISMISS] {identity}");

        Ok(ResponseOutcome::Dismissed)
    }

    /// Moves a one-time alarm `minutes` past `now`. Fixed notes cannot be
    /// snoozed; their entry is only cleared. Non-positive `minutes`, or a note
    /// deleted while ringing, clear the entry without rescheduling.
    pub async fn snooze(
        &self,
        identity: AlarmIdentity,
        minutes: i64,
        now: NaiveDateTime,
        ledger: &mut ActiveAlarmLedger,
    ) -> anyhow::Result<ResponseOutcome> {
        if !ledger.contains(&identity) {
            log::debug!("Snooze of {identity} ignored, it is not ringing");
            return Ok(ResponseOutcome::Ignored);
        }

        let outcome = match identity {
            AlarmIdentity::OneTime(note_id) if minutes > 0 => {
                let until = snoozed_alarm_time(&now, minutes);
                match self.store.upsert_alarm_time(note_id, until).await {
                    Ok(()) => {
                        log::info!("[SNOOZE] {identity} until {until}");
                        ResponseOutcome::Snoozed { until }
                    }
                    Err(StorageError::NoteNotFound(_)) => {
                        log::warn!("[SNOOZE] {identity} cleared, its note no longer exists");
                        ResponseOutcome::Cleared
                    }
                    Err(e) => return Err(e.into()),
                }
            }
            _ => {
                log::info!("[SNOOZE] {identity} cleared without rescheduling");
                ResponseOutcome::Cleared
            }
        };
        ledger.remove(&identity);

        Ok(outcome)
    }

    /// The alarm window went away without an answer.
    pub fn release(
        &self,
        identity: AlarmIdentity,
        ledger: &mut ActiveAlarmLedger,
    ) -> ResponseOutcome {
        match ledger.remove(&identity) {
            Some(_) => {
                log::info!("[RELEASE] {identity}");
                ResponseOutcome::Cleared
            }
            None => ResponseOutcome::Ignored,
        }
    }

    /// Dismisses everything that rang longer than its ring duration. Failures
    /// are logged and the entry keeps ringing until a later attempt succeeds.
    pub async fn expire(
        &self,
        now: NaiveDateTime,
        ledger: &mut ActiveAlarmLedger,
    ) -> Vec<AlarmIdentity> {
        let mut timed_out = Vec::new();
        for identity in ledger.overdue(&now) {
            match self.dismiss(identity, ledger).await {
                Ok(ResponseOutcome::Dismissed) => {
                    log::info!("[TIMEOUT] {identity} was not answered");
                    timed_out.push(identity);
                }
                Ok(_) => {}
                Err(e) => log::warn!("Could not auto-dismiss {identity}: {e}"),
            }
        }
        timed_out
    }
}

/// Time of day `minutes` after `now`, wrapping at midnight.
///
/// Only the time of day moves: the owning note keeps its date, so a snooze
/// that wraps past midnight lands on a time already gone that day and does
/// not ring again.
pub fn snoozed_alarm_time(now: &NaiveDateTime, minutes: i64) -> AlarmTime {
    let offset = TimeDelta::minutes(minutes.rem_euclid(MINUTES_PER_DAY));
    let (time, _) = now.time().overflowing_add_signed(offset);
    AlarmTime::new(time)
}
