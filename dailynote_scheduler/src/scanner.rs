use std::sync::Arc;

use chrono::NaiveDateTime;
use dailynote_models::{alarm::AlarmTime, settings::RecurringAlarmSettings};
use dailynote_storage::AlarmStore;

use crate::{ActiveAlarmLedger, FireEvent};

pub struct TriggerScanner {
    store: Arc<dyn AlarmStore>,
    recurring_alarm: RecurringAlarmSettings,
}

impl TriggerScanner {
    pub fn new(store: Arc<dyn AlarmStore>, recurring_alarm: RecurringAlarmSettings) -> Self {
        Self {
            store,
            recurring_alarm,
        }
    }

    /// Reminders due at the minute of `now` that have not fired for this
    /// occurrence yet. They are entered into `ledger` before being returned,
    /// one-time alarms first, each group by ascending id.
    ///
    /// A store failure leaves the ledger as it was.
    pub async fn scan(
        &self,
        now: NaiveDateTime,
        ledger: &mut ActiveAlarmLedger,
    ) -> anyhow::Result<Vec<FireEvent>> {
        let minute = AlarmTime::of(&now);
        let due_alarms = self.store.load_due_alarms(now.date()).await?;
        let fixed_notes = self.store.load_fixed_notes().await?;

        ledger.prune_settled(&now);

        let one_time = due_alarms
            .into_iter()
            .filter(|due| due.alarm.time == minute)
            .map(FireEvent::from);
        let recurring = fixed_notes
            .into_iter()
            .filter(|note| note.is_due(&now))
            .map(|note| FireEvent::recurring(note, &self.recurring_alarm));

        let mut events: Vec<_> = one_time
            .chain(recurring)
            .filter(|event| !ledger.suppresses(&event.identity, &now))
            .collect();
        events.sort_by_key(|event| event.identity);

        for event in &events {
            ledger.add(event.identity, now, event.ring_duration());
            log::info!(
                "[FIRE] {} {:?} at {} {}",
                event.identity,
                event.title,
                now.date(),
                minute
            );
        }

        Ok(events)
    }
}
