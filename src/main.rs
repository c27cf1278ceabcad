mod appsettings;
mod commands;
mod console;

use std::{sync::Arc, time::Duration};

use anyhow::Context;
use commands::ConsoleCommand;
use console::ConsoleDeliveryChannel;
use dailynote_scheduler::{
    AlarmCommandSender, AlarmEngine, AlarmScheduler, EngineSettings, ResponseOutcome, SystemClock,
};
use dailynote_storage::sqlite::{self, SqliteStore};
use tokio::io::{AsyncBufReadExt, BufReader};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    pretty_env_logger::formatted_timed_builder()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .init();

    let settings = appsettings::load().context("Could not load settings")?;
    log::debug!("Loaded settings: {settings:?}");

    let pool = sqlite::connect(&settings.database.url)
        .await
        .with_context(|| format!("Could not open {}", settings.database.url))?;
    let store = Arc::new(SqliteStore::new(pool));
    let clock = SystemClock::from_timezone_name(&settings.scheduler.timezone)?;

    let engine = AlarmEngine::new(
        store,
        clock,
        EngineSettings {
            recurring_alarm: settings.recurring_alarm.clone(),
            auto_dismiss: settings.scheduler.auto_dismiss,
        },
    );
    let scheduler = AlarmScheduler::new(
        engine,
        Arc::new(ConsoleDeliveryChannel),
        Duration::from_millis(settings.scheduler.tick_interval_ms.max(1)),
    )
    .start();
    let commands = scheduler.commands();

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                log::info!("Ctrl-C received");
                break;
            }
            line = lines.next_line() => {
                let Some(line) = line? else {
                    break;
                };
                if line.trim().is_empty() {
                    continue;
                }
                match commands::parse(&line, settings.snooze.default_minutes) {
                    Ok(ConsoleCommand::Quit) => break,
                    Ok(command) => {
                        if let Err(e) = apply(&commands, command).await {
                            log::error!("{e:#}");
                        }
                    }
                    Err(e) => println!("{e}"),
                }
            }
        }
    }

    let engine = scheduler.shutdown().await?;
    log::info!(
        "Stopped with {} alarm(s) still ringing",
        engine.ledger().len()
    );
    Ok(())
}

async fn apply(commands: &AlarmCommandSender, command: ConsoleCommand) -> anyhow::Result<()> {
    let (identity, outcome) = match command {
        ConsoleCommand::Dismiss(identity) => (identity, commands.dismiss(identity).await?),
        ConsoleCommand::Snooze(identity, minutes) => {
            (identity, commands.snooze(identity, minutes).await?)
        }
        ConsoleCommand::Close(identity) => (identity, commands.release(identity).await?),
        ConsoleCommand::Quit => return Ok(()),
    };

    if outcome == ResponseOutcome::Ignored {
        println!("[{identity}] is not ringing");
    }
    Ok(())
}
