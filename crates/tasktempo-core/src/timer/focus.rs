//! Focus timer: one focus session at a time, last start wins.

use std::sync::Arc;

use tracing::info;

use super::session::{SessionCommand, SessionState, SessionTimer, TerminalPolicy};
use super::TimerKind;
use crate::clock::Clock;
use crate::events::Event;
use crate::storage::SettingsSource;

pub struct FocusTimerEngine {
    timer: SessionTimer,
    settings: Arc<dyn SettingsSource>,
    clock: Arc<dyn Clock>,
}

impl FocusTimerEngine {
    pub fn new(settings: Arc<dyn SettingsSource>, clock: Arc<dyn Clock>) -> Self {
        let default_secs = settings.timer().focus_duration_secs();
        Self {
            timer: SessionTimer::new(TimerKind::Focus, TerminalPolicy::ReturnToIdle, default_secs),
            settings,
            clock,
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn state(&self) -> &SessionState {
        self.timer.state()
    }

    pub fn active_task_id(&self) -> Option<&str> {
        self.state().active_task_id.as_deref()
    }

    pub fn is_active(&self, task_id: Option<&str>) -> bool {
        self.state().is_active(task_id)
    }

    pub fn is_running(&self, task_id: Option<&str>) -> bool {
        self.state().is_running(task_id)
    }

    /// Seconds left in the current session, or the full length when idle.
    pub fn remaining_time(&self) -> u64 {
        self.state().remaining_secs
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Start (or restart) focus on `task_id`. Any previous association is
    /// replaced without an explicit stop. The duration is read from the
    /// settings now and not re-read during the session.
    pub fn start_timer(&mut self, task_id: &str) -> Option<Event> {
        let duration_secs = self.settings.timer().focus_duration_secs();
        if let Some(previous) = self.active_task_id().filter(|prev| *prev != task_id) {
            info!(previous, replacement = task_id, "focus session replaced");
        }
        info!(task_id, duration_secs, "focus session started");
        self.timer.apply(
            SessionCommand::Start {
                task_id: Some(task_id.to_string()),
                duration_secs,
            },
            self.clock.now(),
        )
    }

    /// Back to idle with the countdown refilled from the current settings.
    pub fn stop_timer(&mut self) -> Option<Event> {
        let default_secs = self.settings.timer().focus_duration_secs();
        let event = self
            .timer
            .apply(SessionCommand::Stop { default_secs }, self.clock.now());
        if event.is_some() {
            info!("focus session stopped");
        }
        event
    }

    /// Advance the countdown by one second. Returns `TimerCompleted` on the
    /// tick that reaches zero, after which the countdown holds the currently
    /// configured length.
    pub fn tick(&mut self) -> Option<Event> {
        let default_secs = self.settings.timer().focus_duration_secs();
        let event = self
            .timer
            .apply(SessionCommand::Tick { default_secs }, self.clock.now());
        if let Some(Event::TimerCompleted { task_id, .. }) = &event {
            info!(task_id = task_id.as_deref(), "focus session completed");
        }
        event
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::storage::{Config, SharedSettings};
    use crate::timer::SessionPhase;

    fn engine_with(focus_min: u32) -> (FocusTimerEngine, SharedSettings) {
        let mut config = Config::default();
        config.timer.focus_duration = focus_min;
        let settings = SharedSettings::new(config);
        let engine = FocusTimerEngine::new(Arc::new(settings.clone()), Arc::new(ManualClock::default()));
        (engine, settings)
    }

    #[test]
    fn start_reads_configured_duration() {
        let (mut engine, _) = engine_with(25);
        engine.start_timer("task-1");
        assert_eq!(engine.remaining_time(), 1500);
        assert!(engine.is_running(Some("task-1")));
    }

    #[test]
    fn last_start_wins() {
        let (mut engine, _) = engine_with(25);
        engine.start_timer("task-1");
        engine.start_timer("task-2");
        assert!(!engine.is_running(Some("task-1")));
        assert!(engine.is_running(Some("task-2")));
    }

    #[test]
    fn stop_uses_current_configuration() {
        let (mut engine, settings) = engine_with(25);
        engine.start_timer("task-1");
        settings.update(|c| c.timer.focus_duration = 50);

        // Running session keeps its original length.
        engine.tick();
        assert_eq!(engine.remaining_time(), 1499);

        engine.stop_timer();
        assert_eq!(engine.remaining_time(), 3000);
        assert!(!engine.is_active(None));
    }

    #[test]
    fn completion_refills_from_current_configuration() {
        let (mut engine, settings) = engine_with(1);
        engine.start_timer("task-1");
        settings.update(|c| c.timer.focus_duration = 2);

        for _ in 0..60 {
            engine.tick();
        }
        assert_eq!(engine.state().phase, SessionPhase::Idle);
        assert_eq!(engine.remaining_time(), 120);
    }

    #[test]
    fn completion_keeps_task_and_refills() {
        let (mut engine, _) = engine_with(1);
        engine.start_timer("task-1");
        let mut completions = 0;
        for _ in 0..60 {
            if engine.tick().is_some() {
                completions += 1;
            }
        }
        assert_eq!(completions, 1);
        assert_eq!(engine.state().phase, SessionPhase::Idle);
        assert_eq!(engine.active_task_id(), Some("task-1"));
        assert_eq!(engine.remaining_time(), 60);
        assert!(engine.is_active(Some("task-1")));
        assert!(!engine.is_running(None));
    }
}
