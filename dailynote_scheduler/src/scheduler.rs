
use std::{sync::Arc, time::Duration};

use anyhow::Context;
use dailynote_models::identity::AlarmIdentity;
use tokio::{
    sync::{mpsc, oneshot},
    task::{self, JoinHandle},
    time::MissedTickBehavior,
};
use tokio_util::sync::CancellationToken;

use crate::{AlarmDeliveryChannel, AlarmEngine, AlarmMessage, ResponseOutcome};

const COMMAND_BUFFER: usize = 16;

type Reply = oneshot::Sender<anyhow::Result<ResponseOutcome>>;

#[derive(Debug)]
pub enum AlarmCommand {
    Dismiss {
        identity: AlarmIdentity,
        reply: Reply,
    },
    Snooze {
        identity: AlarmIdentity,
        minutes: i64,
        reply: Reply,
    },
    Release {
        identity: AlarmIdentity,
        reply: Reply,
    },
}

/// Handle for answering alarms owned by a running scheduler.
#[derive(Debug, Clone)]
pub struct AlarmCommandSender(mpsc::Sender<AlarmCommand>);

impl AlarmCommandSender {
    pub async fn dismiss(&self, identity: AlarmIdentity) -> anyhow::Result<ResponseOutcome> {
        self.request(|reply| AlarmCommand::Dismiss { identity, reply })
            .await
    }

    pub async fn snooze(
        &self,
        identity: AlarmIdentity,
        minutes: i64,
    ) -> anyhow::Result<ResponseOutcome> {
        self.request(|reply| AlarmCommand::Snooze {
            identity,
            minutes,
            reply,
        })
        .await
    }

    pub async fn release(&self, identity: AlarmIdentity) -> anyhow::Result<ResponseOutcome> {
        self.request(|reply| AlarmCommand::Release { identity, reply })
            .await
    }

    async fn request(
        &self,
        command: impl FnOnce(Reply) -> AlarmCommand,
    ) -> anyhow::Result<ResponseOutcome> {
        let (reply, response) = oneshot::channel();
        self.0
            .send(command(reply))
            .await
            .context("Alarm scheduler is not running")?;
        response
            .await
            .context("Alarm scheduler stopped before answering")?
    }
}

pub struct AlarmScheduler {
    engine: AlarmEngine,
    delivery_channel: Arc<dyn AlarmDeliveryChannel>,
    period: Duration,
}

impl AlarmScheduler {
    pub fn new(
        engine: AlarmEngine,
        delivery_channel: Arc<dyn AlarmDeliveryChannel>,
        period: Duration,
    ) -> Self {
        Self {
            engine,
            delivery_channel,
            period,
        }
    }

    /// Spawns the scan loop. Every tick auto-dismisses overdue alarms and
    /// then fires whatever is due; commands are handled between ticks.
    pub fn start(self) -> RunningScheduler {
        let (tx, rx) = mpsc::channel(COMMAND_BUFFER);
        let cancellation_token = CancellationToken::new();
        let task_cancellation_token = cancellation_token.child_token();

        log::info!("Starting alarm scheduler, scanning every {:?}", self.period);
        let task = task::spawn(self.run(rx, task_cancellation_token));

        RunningScheduler {
            sender: AlarmCommandSender(tx),
            cancellation_token,
            task,
        }
    }

    async fn run(
        mut self,
        mut rx: mpsc::Receiver<AlarmCommand>,
        cancellation_token: CancellationToken,
    ) -> AlarmEngine {
        let mut interval = tokio::time::interval(self.period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = cancellation_token.cancelled() => {
                    log::info!("Alarm scheduler was cancelled");
                    break;
                }
                _ = interval.tick() => self.on_tick().await,
                command = rx.recv() => match command {
                    Some(command) => self.on_command(command).await,
                    None => {
                        log::info!("All command senders dropped, stopping alarm scheduler");
                        break;
                    }
                },
            }
        }

        self.engine
    }

    async fn on_tick(&mut self) {
        for identity in self.engine.expire_overdue().await {
            self.notify(AlarmMessage::TimedOut(identity)).await;
        }

        match self.engine.scan().await {
            Ok(events) => {
                for event in events {
                    self.notify(AlarmMessage::Fired(event)).await;
                }
            }
            Err(e) => log::warn!("Alarm scan failed, retrying on next tick: {e:#}"),
        }
    }

    async fn on_command(&mut self, command: AlarmCommand) {
        let (identity, result, reply) = match command {
            AlarmCommand::Dismiss { identity, reply } => {
                (identity, self.engine.dismiss(identity).await, reply)
            }
            AlarmCommand::Snooze {
                identity,
                minutes,
                reply,
            } => (identity, self.engine.snooze(identity, minutes).await, reply),
            AlarmCommand::Release { identity, reply } => {
                (identity, Ok(self.engine.release(identity)), reply)
            }
        };

        match &result {
            Ok(outcome) => {
                if let Some(message) = outcome_message(identity, *outcome) {
                    self.notify(message).await;
                }
            }
            Err(e) => log::error!("Could not apply response to {identity}: {e:#}"),
        }

        if reply.send(result).is_err() {
            log::debug!("Response for {identity} was not awaited");
        }
    }

    async fn notify(&self, message: AlarmMessage) {
        self.delivery_channel.send_alarm_notification(message).await;
    }
}

fn outcome_message(identity: AlarmIdentity, outcome: ResponseOutcome) -> Option<AlarmMessage> {
    match outcome {
        ResponseOutcome::Ignored => None,
        ResponseOutcome::Dismissed => Some(AlarmMessage::Dismissed(identity)),
        ResponseOutcome::Snoozed { until } => Some(AlarmMessage::Snoozed { identity, until }),
        ResponseOutcome::Cleared => Some(AlarmMessage::Cleared(identity)),
    }
}

pub struct RunningScheduler {
    sender: AlarmCommandSender,
    cancellation_token: CancellationToken,
    task: JoinHandle<AlarmEngine>,
}

impl RunningScheduler {
    pub fn commands(&self) -> AlarmCommandSender {
        self.sender.clone()
    }

    /// Stops the loop and hands back the engine with its ledger intact.
    pub async fn shutdown(self) -> anyhow::Result<AlarmEngine> {
        self.cancellation_token.cancel();
        let engine = self.task.await.context("Alarm scheduler task failed")?;
        Ok(engine)
    }
}
