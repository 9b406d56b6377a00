//! Task model as seen by the timer engine.
//!
//! Task persistence and synchronization belong to a collaborator
//! ([`TaskStore`]); the engine only reads tasks, writes their status and
//! listens for collection changes.

mod store;

pub use store::{InMemoryTaskStore, TaskChange, TaskStore};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::TaskError;

pub type TaskId = String;

/// Task status.
///
/// ```text
/// TODO ──start focus──> IN_PROGRESS ──finish──> DONE
///   ^                        |
///   +──────end session───────+
/// ```
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    #[default]
    Todo,
    InProgress,
    Done,
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TaskStatus::Todo => write!(f, "todo"),
            TaskStatus::InProgress => write!(f, "in-progress"),
            TaskStatus::Done => write!(f, "done"),
        }
    }
}

impl FromStr for TaskStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "todo" | "to-do" | "to_do" => Ok(TaskStatus::Todo),
            "in-progress" | "in_progress" | "inprogress" => Ok(TaskStatus::InProgress),
            "done" => Ok(TaskStatus::Done),
            other => Err(format!("unknown task status: {other}")),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Subtask {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub completed: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Task {
    pub id: TaskId,
    pub title: String,
    #[serde(default)]
    pub status: TaskStatus,
    #[serde(default)]
    pub subtasks: Vec<Subtask>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Task {
    pub fn new(id: impl Into<TaskId>, title: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: id.into(),
            title: title.into(),
            status: TaskStatus::Todo,
            subtasks: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn with_status(mut self, status: TaskStatus) -> Self {
        self.status = status;
        self
    }

    pub fn with_subtask(mut self, id: impl Into<String>, title: impl Into<String>, completed: bool) -> Self {
        self.subtasks.push(Subtask {
            id: id.into(),
            title: title.into(),
            completed,
        });
        self
    }

    pub fn is_in_progress(&self) -> bool {
        self.status == TaskStatus::InProgress
    }

    /// A task with unfinished subtasks cannot be finished from a
    /// completion decision.
    pub fn has_pending_subtasks(&self) -> bool {
        self.subtasks.iter().any(|s| !s.completed)
    }

    pub fn set_subtask_completed(&mut self, subtask_id: &str, completed: bool) -> Result<(), TaskError> {
        let subtask = self
            .subtasks
            .iter_mut()
            .find(|s| s.id == subtask_id)
            .ok_or_else(|| TaskError::UnknownSubtask {
                task_id: self.id.clone(),
                subtask_id: subtask_id.to_string(),
            })?;
        subtask.completed = completed;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_parses_cli_spellings() {
        assert_eq!("in-progress".parse::<TaskStatus>(), Ok(TaskStatus::InProgress));
        assert_eq!("TODO".parse::<TaskStatus>(), Ok(TaskStatus::Todo));
        assert!("later".parse::<TaskStatus>().is_err());
    }

    #[test]
    fn pending_subtasks() {
        let task = Task::new("t1", "Write report").with_subtask("s1", "Outline", true);
        assert!(!task.has_pending_subtasks());

        let task = task.with_subtask("s2", "Draft", false);
        assert!(task.has_pending_subtasks());
    }

    #[test]
    fn task_serialization() {
        let task = Task::new("t1", "Write report")
            .with_status(TaskStatus::InProgress)
            .with_subtask("s1", "Outline", false);
        let json = serde_json::to_string(&task).unwrap();
        assert!(json.contains("\"in_progress\""));
        let decoded: Task = serde_json::from_str(&json).unwrap();
        assert_eq!(decoded, task);
    }
}
