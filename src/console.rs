use async_trait::async_trait;
use dailynote_scheduler::{AlarmDeliveryChannel, AlarmMessage};

/// Presents alarms on stdout; answers come back through stdin commands.
pub struct ConsoleDeliveryChannel;

#[async_trait]
impl AlarmDeliveryChannel for ConsoleDeliveryChannel {
    async fn send_alarm_notification(&self, message: AlarmMessage) {
        match message {
            AlarmMessage::Fired(event) => {
                let sound = event.sound.as_deref().unwrap_or("default sound");
                println!(
                    "\u{23F0} [{}] {}\n{}\n({sound}, volume {}, rings {}s)",
                    event.identity, event.title, event.body, event.volume, event.duration_secs
                );
                println!(
                    "  dismiss {id} | snooze {id} [minutes] | close {id}",
                    id = event.identity
                );
            }
            AlarmMessage::Snoozed { identity, until } => {
                println!("[{identity}] snoozed until {until}");
            }
            AlarmMessage::Dismissed(identity) => println!("[{identity}] dismissed"),
            AlarmMessage::Cleared(identity) => println!("[{identity}] closed"),
            AlarmMessage::TimedOut(identity) => {
                println!("[{identity}] stopped ringing, nobody answered");
            }
        }
    }
}
