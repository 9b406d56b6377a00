//! Edge-triggered detection of finished sessions.
//!
//! The detector is fed every timer state it should know about and
//! compares it with the previous one. A completion is reported on the
//! transition only, never for a state that merely persists, and at most
//! once until a new session begins.
//!
//! ```text
//! focus:  Running(task) ──► Idle(same task)   => Completion::Focus
//! break:  Running        ──► Ended             => Completion::Break
//! ```

use serde::{Deserialize, Serialize};

use crate::task::TaskId;
use crate::timer::{SessionPhase, SessionState};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "timer", rename_all = "snake_case")]
pub enum Completion {
    Focus { task_id: TaskId },
    Break { task_id: Option<TaskId> },
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Observed {
    phase: SessionPhase,
    task_id: Option<TaskId>,
}

impl From<&SessionState> for Observed {
    fn from(state: &SessionState) -> Self {
        Self {
            phase: state.phase,
            task_id: state.active_task_id.clone(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct SessionCompletionDetector {
    last_focus: Option<Observed>,
    last_break: Option<Observed>,
    focus_reported: bool,
    break_reported: bool,
}

impl SessionCompletionDetector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn focus_reported(&self) -> bool {
        self.focus_reported
    }

    pub fn break_reported(&self) -> bool {
        self.break_reported
    }

    pub fn observe_focus(&mut self, state: &SessionState) -> Option<Completion> {
        let current = Observed::from(state);
        let previous = self.last_focus.replace(current.clone())?;

        let session_started =
            current.phase == SessionPhase::Running && previous.phase != SessionPhase::Running;
        if session_started || current.task_id.is_none() {
            self.focus_reported = false;
        }

        let completed = previous.phase == SessionPhase::Running
            && current.phase == SessionPhase::Idle
            && current.task_id.is_some()
            && previous.task_id == current.task_id;
        if !completed || self.focus_reported {
            return None;
        }

        self.focus_reported = true;
        current.task_id.map(|task_id| Completion::Focus { task_id })
    }

    pub fn observe_break(&mut self, state: &SessionState) -> Option<Completion> {
        let current = Observed::from(state);
        let previous = self.last_break.replace(current.clone())?;

        let session_started =
            current.phase == SessionPhase::Running && previous.phase != SessionPhase::Running;
        if session_started || current.phase == SessionPhase::Idle {
            self.break_reported = false;
        }

        let ended = previous.phase == SessionPhase::Running && current.phase == SessionPhase::Ended;
        if !ended || self.break_reported {
            return None;
        }

        self.break_reported = true;
        Some(Completion::Break {
            task_id: current.task_id,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state(phase: SessionPhase, task: Option<&str>) -> SessionState {
        SessionState {
            active_task_id: task.map(str::to_string),
            phase,
            remaining_secs: 0,
            started_at: None,
            session_secs: 0,
        }
    }

    #[test]
    fn focus_completion_fires_once() {
        let mut detector = SessionCompletionDetector::new();
        assert_eq!(detector.observe_focus(&state(SessionPhase::Idle, None)), None);
        assert_eq!(detector.observe_focus(&state(SessionPhase::Running, Some("a"))), None);

        assert_eq!(
            detector.observe_focus(&state(SessionPhase::Idle, Some("a"))),
            Some(Completion::Focus {
                task_id: "a".into()
            })
        );
        assert_eq!(detector.observe_focus(&state(SessionPhase::Idle, Some("a"))), None);
        assert!(detector.focus_reported());
    }

    #[test]
    fn stop_is_not_completion() {
        let mut detector = SessionCompletionDetector::new();
        detector.observe_focus(&state(SessionPhase::Running, Some("a")));
        assert_eq!(detector.observe_focus(&state(SessionPhase::Idle, None)), None);
    }

    #[test]
    fn new_session_rearms_focus_guard() {
        let mut detector = SessionCompletionDetector::new();
        detector.observe_focus(&state(SessionPhase::Running, Some("a")));
        detector.observe_focus(&state(SessionPhase::Idle, Some("a")));
        detector.observe_focus(&state(SessionPhase::Running, Some("a")));
        assert!(!detector.focus_reported());
        assert!(detector
            .observe_focus(&state(SessionPhase::Idle, Some("a")))
            .is_some());
    }

    #[test]
    fn break_end_fires_until_cleared() {
        let mut detector = SessionCompletionDetector::new();
        detector.observe_break(&state(SessionPhase::Running, None));
        assert_eq!(
            detector.observe_break(&state(SessionPhase::Ended, None)),
            Some(Completion::Break { task_id: None })
        );
        assert_eq!(detector.observe_break(&state(SessionPhase::Ended, None)), None);

        detector.observe_break(&state(SessionPhase::Idle, None));
        assert!(!detector.break_reported());
    }

    #[test]
    fn break_restarted_from_ended_fires_again() {
        let mut detector = SessionCompletionDetector::new();
        detector.observe_break(&state(SessionPhase::Running, None));
        detector.observe_break(&state(SessionPhase::Ended, None));

        detector.observe_break(&state(SessionPhase::Running, Some("a")));
        assert!(!detector.break_reported());
        assert_eq!(
            detector.observe_break(&state(SessionPhase::Ended, Some("a"))),
            Some(Completion::Break {
                task_id: Some("a".into())
            })
        );
    }
}
