mod clock;
mod delivery;
mod engine;
mod ledger;
mod responses;
mod scanner;
mod scheduler;

pub use clock::{Clock, ManualClock, SystemClock};
pub use delivery::{AlarmDeliveryChannel, AlarmMessage, FireEvent};
pub use engine::{AlarmEngine, EngineSettings, TickReport};
pub use ledger::{ActiveAlarmLedger, RingingAlarm};
pub use responses::{ResponseHandler, ResponseOutcome, snoozed_alarm_time};
pub use scanner::TriggerScanner;
pub use scheduler::{AlarmCommand, AlarmCommandSender, AlarmScheduler, RunningScheduler};
