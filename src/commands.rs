use anyhow::{Context, bail};
use dailynote_models::{identity::AlarmIdentity, settings::MAX_SNOOZE_MINUTES};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsoleCommand {
    Dismiss(AlarmIdentity),
    Snooze(AlarmIdentity, i64),
    Close(AlarmIdentity),
    Quit,
}

/// Parses one stdin line. `snooze` without minutes uses `default_snooze`.
pub fn parse(line: &str, default_snooze: i64) -> anyhow::Result<ConsoleCommand> {
    let mut words = line.split_whitespace();
    let Some(verb) = words.next() else {
        bail!("Empty command");
    };

    let command = match verb.to_ascii_lowercase().as_str() {
        "quit" | "exit" => ConsoleCommand::Quit,
        "dismiss" => ConsoleCommand::Dismiss(identity(words.next())?),
        "close" => ConsoleCommand::Close(identity(words.next())?),
        "snooze" => {
            let identity = identity(words.next())?;
            let minutes = match words.next() {
                Some(minutes) => minutes
                    .parse()
                    .with_context(|| format!("Invalid snooze minutes: {minutes}"))?,
                None => default_snooze,
            };
            if !(0..=MAX_SNOOZE_MINUTES).contains(&minutes) {
                bail!("Snooze must be between 0 and {MAX_SNOOZE_MINUTES} minutes");
            }
            ConsoleCommand::Snooze(identity, minutes)
        }
        other => bail!("Unknown command: {other}"),
    };

    if let Some(extra) = words.next() {
        bail!("Unexpected argument: {extra}");
    }

    Ok(command)
}

fn identity(word: Option<&str>) -> anyhow::Result<AlarmIdentity> {
    let word = word.context("Missing alarm id")?;
    word.parse()
        .with_context(|| format!("Invalid alarm id: {word}"))
}
