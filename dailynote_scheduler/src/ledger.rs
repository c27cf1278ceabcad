//! Bookkeeping of what is ringing, so a due reminder fires once per
//! occurrence instead of once per tick.

use std::collections::BTreeMap;

use chrono::{NaiveDateTime, TimeDelta};
use dailynote_models::{alarm::AlarmTime, identity::AlarmIdentity};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RingingAlarm {
    pub fired_at: NaiveDateTime,
    pub ring_until: NaiveDateTime,
}

/// Identities that fired and were not resolved yet.
///
/// Resolving an entry leaves a marker for the minute the alarm fired in, so a
/// later tick in that same minute cannot fire it again. Markers are dropped on
/// the first scan of any other minute.
#[derive(Debug, Default)]
pub struct ActiveAlarmLedger {
    ringing: BTreeMap<AlarmIdentity, RingingAlarm>,
    settled: BTreeMap<AlarmIdentity, NaiveDateTime>,
}

impl ActiveAlarmLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, identity: &AlarmIdentity) -> bool {
        self.ringing.contains_key(identity)
    }

    pub fn add(&mut self, identity: AlarmIdentity, fired_at: NaiveDateTime, ring_for: TimeDelta) {
        let ring_until = fired_at
            .checked_add_signed(ring_for)
            .unwrap_or(NaiveDateTime::MAX);
        log::debug!("Ledger: {identity} ringing until {ring_until}");
        self.ringing.insert(
            identity,
            RingingAlarm {
                fired_at,
                ring_until,
            },
        );
    }

    pub fn remove(&mut self, identity: &AlarmIdentity) -> Option<RingingAlarm> {
        let removed = self.ringing.remove(identity)?;
        self.settled
            .insert(*identity, minute_start(&removed.fired_at));
        log::debug!("Ledger: {identity} resolved");
        Some(removed)
    }

    /// Whether firing `identity` at `now` would fire the same occurrence twice.
    pub fn suppresses(&self, identity: &AlarmIdentity, now: &NaiveDateTime) -> bool {
        self.contains(identity) || self.settled.get(identity) == Some(&minute_start(now))
    }

    pub fn prune_settled(&mut self, now: &NaiveDateTime) {
        let minute = minute_start(now);
        self.settled.retain(|_, settled_minute| *settled_minute == minute);
    }

    /// Ringing identities whose ring duration is over, in identity order.
    pub fn overdue(&self, now: &NaiveDateTime) -> Vec<AlarmIdentity> {
        self.ringing
            .iter()
            .filter(|(_, ringing)| ringing.ring_until <= *now)
            .map(|(identity, _)| *identity)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.ringing.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ringing.is_empty()
    }
}

fn minute_start(now: &NaiveDateTime) -> NaiveDateTime {
    now.date().and_time(AlarmTime::of(now).into_time())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(h: u32, m: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 6, 1)
            .unwrap()
            .and_hms_opt(h, m, s)
            .unwrap()
    }

    const NOTE: AlarmIdentity = AlarmIdentity::OneTime(1);

    #[test]
    fn resolved_entry_suppresses_only_its_own_minute() {
        let mut ledger = ActiveAlarmLedger::new();
        ledger.add(NOTE, at(9, 0, 0), TimeDelta::seconds(10));
        assert!(ledger.suppresses(&NOTE, &at(9, 0, 30)));

        ledger.remove(&NOTE);

        assert!(!ledger.contains(&NOTE));
        assert!(ledger.suppresses(&NOTE, &at(9, 0, 59)));
        assert!(!ledger.suppresses(&NOTE, &at(9, 1, 0)));
    }

    #[test]
    fn pruning_forgets_earlier_minutes() {
        let mut ledger = ActiveAlarmLedger::new();
        ledger.add(NOTE, at(9, 0, 0), TimeDelta::seconds(10));
        ledger.remove(&NOTE);

        ledger.prune_settled(&at(9, 1, 0));

        assert!(!ledger.suppresses(&NOTE, &at(9, 0, 30)));
    }

    #[test]
    fn removing_unknown_identity_is_a_no_op() {
        let mut ledger = ActiveAlarmLedger::new();

        assert_eq!(ledger.remove(&NOTE), None);
        assert!(!ledger.suppresses(&NOTE, &at(9, 0, 0)));
    }

    #[test]
    fn overdue_after_ring_duration() {
        let mut ledger = ActiveAlarmLedger::new();
        ledger.add(NOTE, at(9, 0, 0), TimeDelta::seconds(10));
        ledger.add(AlarmIdentity::Recurring(1), at(9, 0, 0), TimeDelta::seconds(60));

        assert!(ledger.overdue(&at(9, 0, 9)).is_empty());
        assert_eq!(ledger.overdue(&at(9, 0, 10)), vec![NOTE]);
        assert_eq!(ledger.len(), 2);
    }
}
