//! What the user is asked when a session ends, and the answers they can
//! give.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::task::TaskId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FocusChoice {
    /// Stop focus and start a break for the task.
    StartBreak,
    /// Restart focus on the same task without a break.
    ContinueFocus,
    /// Mark the task done. Offered only when no subtask is pending.
    FinishTask,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BreakChoice {
    /// Clear the break and go back to focusing on the task, if any.
    StartFocus,
    /// Put the task back to "to do" and stop both timers.
    EndSession,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionChoice {
    Focus(FocusChoice),
    Break(BreakChoice),
}

impl fmt::Display for DecisionChoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            DecisionChoice::Focus(FocusChoice::StartBreak) => "start break",
            DecisionChoice::Focus(FocusChoice::ContinueFocus) => "continue focus",
            DecisionChoice::Focus(FocusChoice::FinishTask) => "finish task",
            DecisionChoice::Break(BreakChoice::StartFocus) => "start focus",
            DecisionChoice::Break(BreakChoice::EndSession) => "end session",
        };
        f.write_str(label)
    }
}

impl From<FocusChoice> for DecisionChoice {
    fn from(choice: FocusChoice) -> Self {
        DecisionChoice::Focus(choice)
    }
}

impl From<BreakChoice> for DecisionChoice {
    fn from(choice: BreakChoice) -> Self {
        DecisionChoice::Break(choice)
    }
}

/// A one-shot question raised when a countdown reaches zero.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DecisionRequest {
    FocusComplete {
        task_id: TaskId,
        options: Vec<FocusChoice>,
    },
    BreakComplete {
        task_id: Option<TaskId>,
        options: Vec<BreakChoice>,
    },
}

impl DecisionRequest {
    pub fn focus_complete(task_id: impl Into<TaskId>, can_finish: bool) -> Self {
        let mut options = vec![FocusChoice::StartBreak, FocusChoice::ContinueFocus];
        if can_finish {
            options.push(FocusChoice::FinishTask);
        }
        DecisionRequest::FocusComplete {
            task_id: task_id.into(),
            options,
        }
    }

    pub fn break_complete(task_id: Option<TaskId>) -> Self {
        DecisionRequest::BreakComplete {
            task_id,
            options: vec![BreakChoice::StartFocus, BreakChoice::EndSession],
        }
    }

    pub fn task_id(&self) -> Option<&str> {
        match self {
            DecisionRequest::FocusComplete { task_id, .. } => Some(task_id),
            DecisionRequest::BreakComplete { task_id, .. } => task_id.as_deref(),
        }
    }

    /// Options in presentation order.
    pub fn choices(&self) -> Vec<DecisionChoice> {
        match self {
            DecisionRequest::FocusComplete { options, .. } => {
                options.iter().copied().map(DecisionChoice::from).collect()
            }
            DecisionRequest::BreakComplete { options, .. } => {
                options.iter().copied().map(DecisionChoice::from).collect()
            }
        }
    }

    pub fn offers(&self, choice: DecisionChoice) -> bool {
        self.choices().contains(&choice)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finish_offered_only_when_allowed() {
        let blocked = DecisionRequest::focus_complete("t1", false);
        assert!(!blocked.offers(FocusChoice::FinishTask.into()));
        assert_eq!(blocked.choices().len(), 2);

        let open = DecisionRequest::focus_complete("t1", true);
        assert!(open.offers(FocusChoice::FinishTask.into()));
        assert!(!open.offers(BreakChoice::EndSession.into()));
    }

    #[test]
    fn request_serializes_with_kind_tag() {
        let json = serde_json::to_value(DecisionRequest::break_complete(None)).unwrap();
        assert_eq!(json["kind"], "break_complete");
        assert_eq!(json["options"][1], "end_session");
    }
}
