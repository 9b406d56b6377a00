//! Break timer. Its terminal state is sticky: once the countdown ends the
//! timer reports `is_active = true, is_running = false` until
//! [`BreakTimerEngine::stop_break`] is called.

use std::sync::Arc;

use tracing::info;

use super::session::{SessionCommand, SessionPhase, SessionState, SessionTimer, TerminalPolicy};
use super::TimerKind;
use crate::clock::Clock;
use crate::events::Event;
use crate::storage::SettingsSource;

pub struct BreakTimerEngine {
    timer: SessionTimer,
    settings: Arc<dyn SettingsSource>,
    clock: Arc<dyn Clock>,
}

impl BreakTimerEngine {
    pub fn new(settings: Arc<dyn SettingsSource>, clock: Arc<dyn Clock>) -> Self {
        let default_secs = settings.timer().short_break_duration_secs();
        Self {
            timer: SessionTimer::new(TimerKind::Break, TerminalPolicy::HoldEnded, default_secs),
            settings,
            clock,
        }
    }

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

    pub fn has_ended(&self) -> bool {
        self.state().phase == SessionPhase::Ended
    }

    pub fn remaining_time(&self) -> u64 {
        self.state().remaining_secs
    }

    /// Start a break, optionally tied to the task that was just focused on.
    pub fn start_break(&mut self, task_id: Option<&str>) -> Option<Event> {
        let duration_secs = self.settings.timer().short_break_duration_secs();
        info!(task_id, duration_secs, "break started");
        self.timer.apply(
            SessionCommand::Start {
                task_id: task_id.map(str::to_string),
                duration_secs,
            },
            self.clock.now(),
        )
    }

    pub fn stop_break(&mut self) -> Option<Event> {
        let default_secs = self.settings.timer().short_break_duration_secs();
        let event = self
            .timer
            .apply(SessionCommand::Stop { default_secs }, self.clock.now());
        if event.is_some() {
            info!("break stopped");
        }
        event
    }

    pub fn tick(&mut self) -> Option<Event> {
        let default_secs = self.settings.timer().short_break_duration_secs();
        let event = self
            .timer
            .apply(SessionCommand::Tick { default_secs }, self.clock.now());
        if event.is_some() {
            info!(task_id = self.active_task_id(), "break ended");
        }
        event
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::storage::{Config, SharedSettings};

    fn engine() -> BreakTimerEngine {
        let mut config = Config::default();
        config.timer.short_break_duration = 1;
        BreakTimerEngine::new(
            Arc::new(SharedSettings::new(config)),
            Arc::new(ManualClock::default()),
        )
    }

    #[test]
    fn ended_break_is_sticky() {
        let mut engine = engine();
        engine.start_break(Some("task-1"));
        for _ in 0..60 {
            engine.tick();
        }
        assert!(engine.has_ended());

        for _ in 0..10 {
            assert!(engine.tick().is_none());
        }
        assert!(engine.has_ended());
        assert!(engine.is_active(Some("task-1")));
        assert!(!engine.is_running(None));

        engine.stop_break();
        assert_eq!(engine.state().phase, SessionPhase::Idle);
        assert!(!engine.is_active(None));
        assert_eq!(engine.remaining_time(), 60);
    }

    #[test]
    fn break_can_run_untethered() {
        let mut engine = engine();
        engine.start_break(None);
        assert!(engine.is_running(None));
        assert_eq!(engine.active_task_id(), None);
    }
}
