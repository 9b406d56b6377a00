//! Live session: focus on one task from the terminal.
//!
//! Every engine event is printed to stdout as one JSON line. Prompts,
//! status snapshots and errors go to stderr. Commands are read line by line from stdin.

use std::io::{BufRead, Write};
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use clap::Args;
use tasktempo_core::{
    AlertKind, Config, CoreError, DecisionChoice, DecisionError, DecisionRequest, DriverTick,
    Event, FileTaskStore, FocusCoordinator, SessionDriver, SharedSettings, SystemClock, TaskError,
    TaskStore,
};
use tokio::sync::mpsc::{self, UnboundedReceiver};
use tracing::warn;

/// Countdown period under `--fast`.
const FAST_TICK_MS: u64 = 10;

#[derive(Args)]
pub struct SessionArgs {
    /// Task to focus on
    task_id: String,
    /// Run the countdown at 100 ticks per second
    #[arg(long)]
    fast: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum SessionInput {
    Stop,
    Break,
    EndBreak,
    Status,
    Dismiss(AlertKind),
    Subtask(String),
    Choose(usize),
    Quit,
}

impl FromStr for SessionInput {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.split_whitespace();
        let command = parts.next().ok_or("empty command")?;
        let arg = parts.next();

        let input = match (command, arg) {
            ("stop", None) => SessionInput::Stop,
            ("break", None) => SessionInput::Break,
            ("end-break", None) => SessionInput::EndBreak,
            ("status", None) => SessionInput::Status,
            ("quit" | "exit", None) => SessionInput::Quit,
            ("dismiss", Some(alert)) => SessionInput::Dismiss(alert.parse()?),
            ("subtask", Some(id)) => SessionInput::Subtask(id.to_string()),
            (n, None) if n.chars().all(|c| c.is_ascii_digit()) => {
                SessionInput::Choose(n.parse().map_err(|_| format!("bad option: {n}"))?)
            }
            _ => return Err(format!("unknown command: {s}")),
        };
        if parts.next().is_some() {
            return Err(format!("unexpected arguments: {s}"));
        }
        Ok(input)
    }
}

pub fn run(args: SessionArgs) -> Result<(), Box<dyn std::error::Error>> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    runtime.block_on(drive(args))
}

async fn drive(args: SessionArgs) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load()?;
    let settings = Arc::new(SharedSettings::new(config.clone()));
    let store = Arc::new(FileTaskStore::open_default()?);
    if store.get_task(&args.task_id).is_none() {
        return Err(TaskError::NotFound(args.task_id).into());
    }

    let (coordinator, mut decisions) =
        FocusCoordinator::new(store.clone(), settings.clone(), Arc::new(SystemClock));
    let (mut driver, mut ticks) = if args.fast {
        SessionDriver::new(
            coordinator,
            Duration::from_millis(FAST_TICK_MS),
            Duration::from_secs(config.alerts.evaluation_interval_secs.max(1)),
        )
    } else {
        SessionDriver::from_settings(coordinator, settings.as_ref())
    };
    let mut input = spawn_stdin_reader();

    driver.open();
    emit(&driver.run(|c| c.start_focus(&args.task_id)))?;

    loop {
        tokio::select! {
            Some(tick) = ticks.recv() => {
                if tick == DriverTick::Alerts {
                    if let Err(e) = store.reload() {
                        warn!(error = %e, "could not reload task file");
                    }
                }
                emit(&driver.handle_tick(tick))?;
            }
            Some(request) = decisions.recv() => present(&request),
            line = input.recv() => {
                let Some(line) = line else { break };
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }
                match line.parse::<SessionInput>() {
                    Ok(SessionInput::Quit) => break,
                    Ok(command) => match apply(&mut driver, &args.task_id, command) {
                        Ok(events) => emit(&events)?,
                        Err(e) => eprintln!("error: {e}"),
                    },
                    Err(e) => eprintln!("{e}"),
                }
            }
        }
    }

    emit(&driver.run(|c| {
        let mut events = c.stop_focus();
        events.extend(c.stop_break());
        events
    }))?;
    driver.shutdown();
    Ok(())
}

fn apply(
    driver: &mut SessionDriver,
    task_id: &str,
    input: SessionInput,
) -> Result<Vec<Event>, CoreError> {
    match input {
        SessionInput::Stop => Ok(driver.run(|c| {
            let mut events = c.stop_focus();
            events.extend(c.stop_break());
            events
        })),
        SessionInput::Break => Ok(driver.run(|c| {
            let mut events = c.stop_focus();
            events.extend(c.start_break(Some(task_id)));
            events
        })),
        SessionInput::EndBreak => Ok(driver.run(|c| c.stop_break())),
        SessionInput::Status => {
            let snapshot = driver.coordinator().snapshot();
            eprintln!("{}", serde_json::to_string(&snapshot)?);
            for banner in driver.coordinator().alert_banners() {
                match banner.task_title {
                    Some(title) => eprintln!("alert: {} ({title})", banner.alert),
                    None => eprintln!("alert: {}", banner.alert),
                }
            }
            Ok(Vec::new())
        }
        SessionInput::Dismiss(alert) => Ok(driver.run(|c| c.dismiss(alert))),
        SessionInput::Subtask(subtask_id) => {
            driver.run(|c| c.complete_subtask(task_id, &subtask_id))
        }
        SessionInput::Choose(n) => {
            let coordinator = driver.coordinator();
            let request = coordinator
                .pending_focus_decision()
                .or(coordinator.pending_break_decision())
                .ok_or(DecisionError::NoPendingDecision)?;
            let choice = n
                .checked_sub(1)
                .and_then(|i| request.choices().get(i).copied())
                .ok_or_else(|| CoreError::Custom(format!("no option {n}")))?;
            driver.run(|c| match choice {
                DecisionChoice::Focus(choice) => c.resolve_focus(choice),
                DecisionChoice::Break(choice) => c.resolve_break(choice),
            })
        }
        SessionInput::Quit => Ok(Vec::new()),
    }
}

fn present(request: &DecisionRequest) {
    let heading = match request {
        DecisionRequest::FocusComplete { .. } => "focus session complete",
        DecisionRequest::BreakComplete { .. } => "break is over",
    };
    eprintln!("{heading}:");
    for (i, choice) in request.choices().iter().enumerate() {
        eprintln!("  {}) {choice}", i + 1);
    }
}

fn emit(events: &[Event]) -> Result<(), Box<dyn std::error::Error>> {
    let mut out = std::io::stdout().lock();
    for event in events {
        writeln!(out, "{}", serde_json::to_string(event)?)?;
    }
    out.flush()?;
    Ok(())
}

fn spawn_stdin_reader() -> UnboundedReceiver<String> {
    let (tx, rx) = mpsc::unbounded_channel();
    std::thread::spawn(move || {
        for line in std::io::stdin().lock().lines() {
            let Ok(line) = line else { break };
            if tx.send(line).is_err() {
                break;
            }
        }
    });
    rx
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_session_commands() {
        assert_eq!("stop".parse::<SessionInput>(), Ok(SessionInput::Stop));
        assert_eq!("end-break".parse::<SessionInput>(), Ok(SessionInput::EndBreak));
        assert_eq!("2".parse::<SessionInput>(), Ok(SessionInput::Choose(2)));
        assert_eq!(
            "dismiss inactivity".parse::<SessionInput>(),
            Ok(SessionInput::Dismiss(AlertKind::ProlongedNavigation))
        );
        assert_eq!(
            "subtask s-1".parse::<SessionInput>(),
            Ok(SessionInput::Subtask("s-1".into()))
        );
    }

    #[test]
    fn rejects_malformed_commands() {
        assert!("dismiss".parse::<SessionInput>().is_err());
        assert!("dismiss nope".parse::<SessionInput>().is_err());
        assert!("stop now".parse::<SessionInput>().is_err());
        assert!("jump".parse::<SessionInput>().is_err());
    }
}
