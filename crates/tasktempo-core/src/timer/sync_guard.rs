//! Keeps the timers honest about task changes made elsewhere.
//!
//! Whenever the task collection changes, each timer that is bound to a
//! task looks that task up; if it is gone or no longer in progress the
//! timer is stopped. The guard holds nothing but its subscription.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::sync::mpsc::error::TryRecvError;
use tracing::warn;

use super::{BreakTimerEngine, FocusTimerEngine, TimerKind};
use crate::events::Event;
use crate::task::{TaskChange, TaskStatus, TaskStore};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ForceStopReason {
    TaskMissing,
    TaskNotInProgress { status: TaskStatus },
}

pub struct TimerTaskSyncGuard {
    changes: UnboundedReceiver<TaskChange>,
}

impl TimerTaskSyncGuard {
    pub fn new(changes: UnboundedReceiver<TaskChange>) -> Self {
        Self { changes }
    }

    pub fn subscribe(store: &dyn TaskStore) -> Self {
        Self::new(store.subscribe())
    }

    /// Drain pending change notifications. Returns true if anything
    /// arrived, meaning a reconcile is due.
    pub fn take_changes(&mut self) -> bool {
        let mut changed = false;
        loop {
            match self.changes.try_recv() {
                Ok(_) => changed = true,
                Err(TryRecvError::Empty | TryRecvError::Disconnected) => return changed,
            }
        }
    }

    /// Drain notifications and reconcile both timers if any arrived.
    pub fn poll(
        &mut self,
        store: &dyn TaskStore,
        focus: &mut FocusTimerEngine,
        rest: &mut BreakTimerEngine,
        now: DateTime<Utc>,
    ) -> Vec<Event> {
        if !self.take_changes() {
            return Vec::new();
        }
        Self::reconcile(store, focus, rest, now)
    }

    /// Stop every timer whose task is missing or not in progress.
    pub fn reconcile(
        store: &dyn TaskStore,
        focus: &mut FocusTimerEngine,
        rest: &mut BreakTimerEngine,
        now: DateTime<Utc>,
    ) -> Vec<Event> {
        let mut events = Vec::new();

        if let Some((task_id, reason)) = invalid_binding(store, focus.active_task_id()) {
            warn!(%task_id, ?reason, "stopping focus timer for invalid task");
            events.extend(focus.stop_timer());
            events.push(Event::TimerForceStopped {
                timer: TimerKind::Focus,
                task_id,
                reason,
                at: now,
            });
        }

        if let Some((task_id, reason)) = invalid_binding(store, rest.active_task_id()) {
            warn!(%task_id, ?reason, "stopping break timer for invalid task");
            events.extend(rest.stop_break());
            events.push(Event::TimerForceStopped {
                timer: TimerKind::Break,
                task_id,
                reason,
                at: now,
            });
        }

        events
    }
}

fn invalid_binding(
    store: &dyn TaskStore,
    task_id: Option<&str>,
) -> Option<(String, ForceStopReason)> {
    let task_id = task_id?;
    let reason = match store.get_task(task_id) {
        None => ForceStopReason::TaskMissing,
        Some(task) if task.status != TaskStatus::InProgress => {
            ForceStopReason::TaskNotInProgress {
                status: task.status,
            }
        }
        Some(_) => return None,
    };
    Some((task_id.to_string(), reason))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::storage::{Config, SharedSettings};
    use crate::task::{InMemoryTaskStore, Task};
    use std::sync::Arc;

    fn engines() -> (FocusTimerEngine, BreakTimerEngine) {
        let settings = Arc::new(SharedSettings::new(Config::default()));
        let clock = Arc::new(ManualClock::default());
        (
            FocusTimerEngine::new(settings.clone(), clock.clone()),
            BreakTimerEngine::new(settings, clock),
        )
    }

    #[test]
    fn stops_focus_when_task_marked_done_elsewhere() {
        let store = InMemoryTaskStore::with_tasks([
            Task::new("t1", "One").with_status(TaskStatus::InProgress)
        ]);
        let mut guard = TimerTaskSyncGuard::subscribe(&store);
        let (mut focus, mut rest) = engines();
        focus.start_timer("t1");

        assert!(guard.poll(&store, &mut focus, &mut rest, Utc::now()).is_empty());

        store.update_task_status("t1", TaskStatus::Done).unwrap();
        let events = guard.poll(&store, &mut focus, &mut rest, Utc::now());
        assert!(!focus.is_active(None));
        assert!(events.iter().any(|e| matches!(
            e,
            Event::TimerForceStopped {
                timer: TimerKind::Focus,
                reason: ForceStopReason::TaskNotInProgress {
                    status: TaskStatus::Done
                },
                ..
            }
        )));
    }

    #[test]
    fn stops_break_when_task_removed() {
        let store = InMemoryTaskStore::with_tasks([
            Task::new("t1", "One").with_status(TaskStatus::InProgress)
        ]);
        let mut guard = TimerTaskSyncGuard::subscribe(&store);
        let (mut focus, mut rest) = engines();
        rest.start_break(Some("t1"));

        store.remove("t1");
        guard.poll(&store, &mut focus, &mut rest, Utc::now());
        assert!(!rest.is_active(None));
    }

    #[test]
    fn untethered_break_is_left_alone() {
        let store = InMemoryTaskStore::with_tasks([Task::new("t1", "One")]);
        let mut guard = TimerTaskSyncGuard::subscribe(&store);
        let (mut focus, mut rest) = engines();
        rest.start_break(None);

        store.update_task_status("t1", TaskStatus::Done).unwrap();
        assert!(guard.poll(&store, &mut focus, &mut rest, Utc::now()).is_empty());
        assert!(rest.is_running(None));
    }
}
