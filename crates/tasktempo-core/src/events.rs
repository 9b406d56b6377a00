use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::alerts::{AlertKind, AlertVisibility};
use crate::session::decision::{DecisionChoice, DecisionRequest};
use crate::task::{TaskId, TaskStatus};
use crate::timer::{ForceStopReason, SessionState, TimerKind};

/// Every state change in the engine produces an Event.
/// The UI renders from them; the CLI prints them as JSON lines.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    TimerStarted {
        timer: TimerKind,
        task_id: Option<TaskId>,
        duration_secs: u64,
        at: DateTime<Utc>,
    },
    /// Countdown reached zero. The timer keeps its task until a decision
    /// or a stop clears it.
    TimerCompleted {
        timer: TimerKind,
        task_id: Option<TaskId>,
        at: DateTime<Utc>,
    },
    TimerStopped {
        timer: TimerKind,
        task_id: Option<TaskId>,
        remaining_secs: u64,
        at: DateTime<Utc>,
    },
    /// A timer was stopped because its task changed underneath it.
    TimerForceStopped {
        timer: TimerKind,
        task_id: TaskId,
        reason: ForceStopReason,
        at: DateTime<Utc>,
    },
    AlertShown {
        alert: AlertKind,
        at: DateTime<Utc>,
    },
    AlertHidden {
        alert: AlertKind,
        at: DateTime<Utc>,
    },
    AlertDismissed {
        alert: AlertKind,
        at: DateTime<Utc>,
    },
    /// A dismissal lapsed; the alert may show again.
    AlertRearmed {
        alert: AlertKind,
        at: DateTime<Utc>,
    },
    DecisionRequested {
        request: DecisionRequest,
        at: DateTime<Utc>,
    },
    DecisionResolved {
        choice: DecisionChoice,
        task_id: Option<TaskId>,
        at: DateTime<Utc>,
    },
    /// A pending decision no longer applies (its timer was stopped or
    /// reassigned before the user answered).
    DecisionWithdrawn {
        timer: TimerKind,
        at: DateTime<Utc>,
    },
    TaskStatusChanged {
        task_id: TaskId,
        status: TaskStatus,
        at: DateTime<Utc>,
    },
    /// A task write failed; local state went ahead anyway.
    TaskWriteFailed {
        task_id: TaskId,
        message: String,
        at: DateTime<Utc>,
    },
}

/// Full view of the engine at one instant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub focus: SessionState,
    pub break_timer: SessionState,
    pub alerts: AlertVisibility,
    pub pending_focus_decision: Option<DecisionRequest>,
    pub pending_break_decision: Option<DecisionRequest>,
    pub at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn events_are_tagged_by_type() {
        let event = Event::AlertShown {
            alert: AlertKind::MissingBreak,
            at: Utc::now(),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "alert_shown");
        assert_eq!(json["alert"], "missing_break");

        let decoded: Event = serde_json::from_value(json).unwrap();
        assert_eq!(decoded, event);
    }
}
