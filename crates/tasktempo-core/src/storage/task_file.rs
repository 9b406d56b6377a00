//! JSON-file task collection.
//!
//! Tasks live in `tasks.json` inside the data directory. An
//! [`InMemoryTaskStore`] serves reads and publishes changes. Every write
//! goes to disk first and reaches the cache only once the file has been
//! written. Other processes may edit the file, so
//! [`FileTaskStore::reload`] re-reads it and publishes whatever differs.

use std::path::{Path, PathBuf};

use chrono::Utc;
use tokio::sync::mpsc::UnboundedReceiver;
use tracing::{debug, warn};
use uuid::Uuid;

use super::data_dir;
use crate::error::{CoreError, TaskError};
use crate::task::{InMemoryTaskStore, Subtask, Task, TaskChange, TaskStatus, TaskStore};

pub struct FileTaskStore {
    path: PathBuf,
    cache: InMemoryTaskStore,
}

impl FileTaskStore {
    /// Open `tasks.json` in the data directory.
    pub fn open_default() -> Result<Self, CoreError> {
        Self::open(data_dir()?.join("tasks.json"))
    }

    /// Open a task file. A missing file is an empty collection.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, CoreError> {
        let path = path.into();
        let tasks = read_tasks(&path)?;
        Ok(Self {
            path,
            cache: InMemoryTaskStore::with_tasks(tasks),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn list(&self) -> Vec<Task> {
        let mut tasks = self.cache.list();
        tasks.sort_by_key(|t| t.created_at);
        tasks
    }

    /// Create a task with a fresh id. Subtasks get their own ids.
    pub fn add_task(&self, title: &str, subtasks: &[String]) -> Result<Task, CoreError> {
        let mut task = Task::new(Uuid::new_v4().to_string(), title);
        task.subtasks = subtasks
            .iter()
            .map(|title| Subtask {
                id: Uuid::new_v4().to_string(),
                title: title.clone(),
                completed: false,
            })
            .collect();
        let mut tasks = self.cache.list();
        tasks.push(task.clone());
        self.persist(&task.id, tasks)?;
        self.cache.upsert(task.clone());
        Ok(task)
    }

    pub fn remove_task(&self, id: &str) -> Result<Task, CoreError> {
        if self.cache.get_task(id).is_none() {
            return Err(TaskError::NotFound(id.to_string()).into());
        }
        let remaining = self.cache.list().into_iter().filter(|t| t.id != id).collect();
        self.persist(id, remaining)?;
        self.cache
            .remove(id)
            .ok_or_else(|| TaskError::NotFound(id.to_string()).into())
    }

    /// Bring the cache in line with the file, publishing a change for
    /// every task that was added, edited or removed on disk.
    pub fn reload(&self) -> Result<usize, TaskError> {
        let on_disk = read_tasks(&self.path).map_err(|e| TaskError::Storage(e.to_string()))?;
        let mut changed = 0;

        for cached in self.cache.list() {
            if !on_disk.iter().any(|t| t.id == cached.id) {
                self.cache.remove(&cached.id);
                changed += 1;
            }
        }
        for task in on_disk {
            if self.cache.get_task(&task.id).as_ref() != Some(&task) {
                self.cache.upsert(task);
                changed += 1;
            }
        }

        if changed > 0 {
            debug!(changed, path = %self.path.display(), "task file reloaded");
        }
        Ok(changed)
    }

    /// Write `tasks` as the whole collection. The cache is not touched.
    fn persist(&self, id: &str, mut tasks: Vec<Task>) -> Result<(), TaskError> {
        tasks.sort_by_key(|t| t.created_at);
        write_tasks(&self.path, &tasks).map_err(|e| {
            warn!(task_id = id, error = %e, "failed to write task file");
            TaskError::WriteFailed {
                id: id.to_string(),
                message: e.to_string(),
            }
        })
    }

    /// Apply `edit` to a copy of the task, store the result on disk, then
    /// publish it through the cache.
    fn write_through<F>(&self, id: &str, edit: F) -> Result<(), TaskError>
    where
        F: FnOnce(&mut Task) -> Result<(), TaskError>,
    {
        let mut candidate = self
            .cache
            .get_task(id)
            .ok_or_else(|| TaskError::NotFound(id.to_string()))?;
        edit(&mut candidate)?;
        candidate.updated_at = Utc::now();

        let tasks = self
            .cache
            .list()
            .into_iter()
            .map(|t| if t.id == id { candidate.clone() } else { t })
            .collect();
        self.persist(id, tasks)?;
        self.cache.upsert(candidate);
        Ok(())
    }
}

fn write_tasks(path: &Path, tasks: &[Task]) -> Result<(), CoreError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let content = serde_json::to_string_pretty(tasks)?;
    std::fs::write(path, content)?;
    Ok(())
}

fn read_tasks(path: &Path) -> Result<Vec<Task>, CoreError> {
    match std::fs::read_to_string(path) {
        Ok(content) if content.trim().is_empty() => Ok(Vec::new()),
        Ok(content) => Ok(serde_json::from_str(&content)?),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Vec::new()),
        Err(e) => Err(e.into()),
    }
}

impl TaskStore for FileTaskStore {
    fn get_task(&self, id: &str) -> Option<Task> {
        self.cache.get_task(id)
    }

    fn refresh_task(&self, id: &str) -> Result<Task, TaskError> {
        self.reload()?;
        self.cache.refresh_task(id)
    }

    fn update_task_status(&self, id: &str, status: TaskStatus) -> Result<(), TaskError> {
        self.write_through(id, |task| {
            task.status = status;
            Ok(())
        })
    }

    fn has_other_task_in_progress(&self, excluding_id: &str) -> bool {
        self.cache.has_other_task_in_progress(excluding_id)
    }

    fn set_subtask_completed(
        &self,
        task_id: &str,
        subtask_id: &str,
        completed: bool,
    ) -> Result<(), TaskError> {
        self.write_through(task_id, |task| {
            task.set_subtask_completed(subtask_id, completed)
        })
    }

    fn subscribe(&self) -> UnboundedReceiver<TaskChange> {
        self.cache.subscribe()
    }
}
