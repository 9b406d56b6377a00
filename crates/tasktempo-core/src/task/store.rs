//! Task collaborator interface and the in-process cache implementation.

use std::collections::BTreeMap;
use std::sync::Mutex;

use chrono::Utc;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

use super::{Task, TaskId, TaskStatus};
use crate::error::TaskError;

/// A change to the task collection, published to every subscriber.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskChange {
    Upserted(TaskId),
    Removed(TaskId),
}

/// Everything the engine needs from task storage.
///
/// Implementations synchronize with wherever tasks really live; changes
/// made elsewhere (another device, another screen) must show up on the
/// [`subscribe`](TaskStore::subscribe) stream.
pub trait TaskStore: Send + Sync {
    /// Local cache lookup.
    fn get_task(&self, id: &str) -> Option<Task>;

    /// Fetch from the source of truth when the cache misses.
    fn refresh_task(&self, id: &str) -> Result<Task, TaskError>;

    fn update_task_status(&self, id: &str, status: TaskStatus) -> Result<(), TaskError>;

    fn has_other_task_in_progress(&self, excluding_id: &str) -> bool;

    fn set_subtask_completed(
        &self,
        task_id: &str,
        subtask_id: &str,
        completed: bool,
    ) -> Result<(), TaskError>;

    fn subscribe(&self) -> UnboundedReceiver<TaskChange>;
}

#[derive(Default)]
struct Inner {
    tasks: BTreeMap<TaskId, Task>,
    subscribers: Vec<UnboundedSender<TaskChange>>,
}

impl Inner {
    fn publish(&mut self, change: TaskChange) {
        self.subscribers.retain(|tx| tx.send(change.clone()).is_ok());
    }
}

/// Task collection held in memory. Every mutation is published to all
/// live subscribers; closed subscriptions are pruned on the next publish.
#[derive(Default)]
pub struct InMemoryTaskStore {
    inner: Mutex<Inner>,
}

impl InMemoryTaskStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tasks(tasks: impl IntoIterator<Item = Task>) -> Self {
        let store = Self::new();
        for task in tasks {
            store.upsert(task);
        }
        store
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn upsert(&self, task: Task) {
        let mut inner = self.lock();
        let id = task.id.clone();
        inner.tasks.insert(id.clone(), task);
        inner.publish(TaskChange::Upserted(id));
    }

    pub fn remove(&self, id: &str) -> Option<Task> {
        let mut inner = self.lock();
        let removed = inner.tasks.remove(id);
        if removed.is_some() {
            inner.publish(TaskChange::Removed(id.to_string()));
        }
        removed
    }

    pub fn list(&self) -> Vec<Task> {
        self.lock().tasks.values().cloned().collect()
    }

    fn modify<F>(&self, id: &str, f: F) -> Result<(), TaskError>
    where
        F: FnOnce(&mut Task) -> Result<(), TaskError>,
    {
        let mut inner = self.lock();
        let task = inner
            .tasks
            .get_mut(id)
            .ok_or_else(|| TaskError::NotFound(id.to_string()))?;
        f(task)?;
        task.updated_at = Utc::now();
        inner.publish(TaskChange::Upserted(id.to_string()));
        Ok(())
    }
}

impl TaskStore for InMemoryTaskStore {
    fn get_task(&self, id: &str) -> Option<Task> {
        self.lock().tasks.get(id).cloned()
    }

    fn refresh_task(&self, id: &str) -> Result<Task, TaskError> {
        self.get_task(id)
            .ok_or_else(|| TaskError::NotFound(id.to_string()))
    }

    fn update_task_status(&self, id: &str, status: TaskStatus) -> Result<(), TaskError> {
        self.modify(id, |task| {
            task.status = status;
            Ok(())
        })
    }

    fn has_other_task_in_progress(&self, excluding_id: &str) -> bool {
        self.lock()
            .tasks
            .values()
            .any(|t| t.id != excluding_id && t.is_in_progress())
    }

    fn set_subtask_completed(
        &self,
        task_id: &str,
        subtask_id: &str,
        completed: bool,
    ) -> Result<(), TaskError> {
        self.modify(task_id, |task| task.set_subtask_completed(subtask_id, completed))
    }

    fn subscribe(&self) -> UnboundedReceiver<TaskChange> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.lock().subscribers.push(tx);
        rx
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mutations_are_published() {
        let store = InMemoryTaskStore::with_tasks([Task::new("t1", "One")]);
        let mut rx = store.subscribe();

        store.update_task_status("t1", TaskStatus::InProgress).unwrap();
        store.remove("t1");

        assert_eq!(rx.try_recv().unwrap(), TaskChange::Upserted("t1".into()));
        assert_eq!(rx.try_recv().unwrap(), TaskChange::Removed("t1".into()));
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn other_task_in_progress_excludes_given_id() {
        let store = InMemoryTaskStore::with_tasks([
            Task::new("t1", "One").with_status(TaskStatus::InProgress),
            Task::new("t2", "Two"),
        ]);
        assert!(!store.has_other_task_in_progress("t1"));
        assert!(store.has_other_task_in_progress("t2"));
    }

    #[test]
    fn unknown_subtask_is_an_error() {
        let store = InMemoryTaskStore::with_tasks([Task::new("t1", "One").with_subtask("s1", "a", false)]);
        assert!(store.set_subtask_completed("t1", "s1", true).is_ok());
        assert_eq!(
            store.set_subtask_completed("t1", "nope", true),
            Err(TaskError::UnknownSubtask {
                task_id: "t1".into(),
                subtask_id: "nope".into()
            })
        );
        assert_eq!(
            store.update_task_status("missing", TaskStatus::Done),
            Err(TaskError::NotFound("missing".into()))
        );
    }

    #[test]
    fn dropped_subscribers_are_pruned() {
        let store = InMemoryTaskStore::new();
        drop(store.subscribe());
        store.upsert(Task::new("t1", "One"));
        assert!(store.lock().subscribers.is_empty());
    }
}
