#[cfg(test)]
mod tests;

use std::sync::Arc;

use dailynote_models::{identity::AlarmIdentity, settings::RecurringAlarmSettings};
use dailynote_storage::AlarmStore;

use crate::{
    ActiveAlarmLedger, Clock, FireEvent, ResponseHandler, ResponseOutcome, TriggerScanner,
};

#[derive(Debug, Clone)]
pub struct EngineSettings {
    pub recurring_alarm: RecurringAlarmSettings,
    pub auto_dismiss: bool,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            recurring_alarm: RecurringAlarmSettings::default(),
            auto_dismiss: true,
        }
    }
}

#[derive(Debug, Default, PartialEq, Eq)]
pub struct TickReport {
    pub timed_out: Vec<AlarmIdentity>,
    pub fired: Vec<FireEvent>,
}

/// Scanner, response handler and ledger bound to one clock.
///
/// Not meant to be shared: whoever owns the engine is the single place
/// scheduling decisions happen.
pub struct AlarmEngine {
    clock: Box<dyn Clock>,
    scanner: TriggerScanner,
    responses: ResponseHandler,
    ledger: ActiveAlarmLedger,
    auto_dismiss: bool,
}

impl AlarmEngine {
    pub fn new(store: Arc<dyn AlarmStore>, clock: impl Clock, settings: EngineSettings) -> Self {
        Self {
            clock: Box::new(clock),
            scanner: TriggerScanner::new(Arc::clone(&store), settings.recurring_alarm),
            responses: ResponseHandler::new(store),
            ledger: ActiveAlarmLedger::new(),
            auto_dismiss: settings.auto_dismiss,
        }
    }

    pub fn with_ledger(mut self, ledger: ActiveAlarmLedger) -> Self {
        self.ledger = ledger;
        self
    }

    pub fn ledger(&self) -> &ActiveAlarmLedger {
        &self.ledger
    }

    /// Auto-dismisses unanswered alarms when enabled; otherwise does nothing.
    pub async fn expire_overdue(&mut self) -> Vec<AlarmIdentity> {
        if !self.auto_dismiss {
            return Vec::new();
        }
        let now = self.clock.now();
        self.responses.expire(now, &mut self.ledger).await
    }

    pub async fn scan(&mut self) -> anyhow::Result<Vec<FireEvent>> {
        let now = self.clock.now();
        self.scanner.scan(now, &mut self.ledger).await
    }

    pub async fn tick(&mut self) -> anyhow::Result<TickReport> {
        let timed_out = self.expire_overdue().await;
        let fired = self.scan().await?;
        Ok(TickReport { timed_out, fired })
    }

    pub async fn dismiss(&mut self, identity: AlarmIdentity) -> anyhow::Result<ResponseOutcome> {
        self.responses.dismiss(identity, &mut self.ledger).await
    }

    pub async fn snooze(
        &mut self,
        identity: AlarmIdentity,
        minutes: i64,
    ) -> anyhow::Result<ResponseOutcome> {
        let now = self.clock.now();
        self.responses
            .snooze(identity, minutes, now, &mut self.ledger)
            .await
    }

    pub fn release(&mut self, identity: AlarmIdentity) -> ResponseOutcome {
        self.responses.release(identity, &mut self.ledger)
    }
}
