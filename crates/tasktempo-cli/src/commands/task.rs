//! Task management commands for CLI.

use clap::Subcommand;
use tasktempo_core::{FileTaskStore, TaskStatus, TaskStore};

#[derive(Subcommand)]
pub enum TaskAction {
    /// Create a new task
    Add {
        /// Task title
        title: String,
        /// Subtask title (repeatable)
        #[arg(long = "subtask")]
        subtasks: Vec<String>,
    },
    /// List tasks
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Change a task's status
    Status {
        /// Task ID
        id: String,
        /// todo, in-progress or done
        status: TaskStatus,
    },
    /// Mark a subtask done (or not done with --undo)
    Subtask {
        /// Task ID
        task_id: String,
        /// Subtask ID
        subtask_id: String,
        #[arg(long)]
        undo: bool,
    },
    /// Delete a task
    Remove {
        /// Task ID
        id: String,
    },
}

pub fn run(action: TaskAction) -> Result<(), Box<dyn std::error::Error>> {
    let store = FileTaskStore::open_default()?;

    match action {
        TaskAction::Add { title, subtasks } => {
            let task = store.add_task(&title, &subtasks)?;
            println!("{}", serde_json::to_string_pretty(&task)?);
        }
        TaskAction::List { json } => {
            let tasks = store.list();
            if json {
                println!("{}", serde_json::to_string_pretty(&tasks)?);
                return Ok(());
            }
            if tasks.is_empty() {
                println!("no tasks");
            }
            for task in tasks {
                println!("{}  [{}]  {}", task.id, task.status, task.title);
                for subtask in &task.subtasks {
                    let mark = if subtask.completed { "x" } else { " " };
                    println!("    [{mark}] {}  {}", subtask.id, subtask.title);
                }
            }
        }
        TaskAction::Status { id, status } => {
            store.update_task_status(&id, status)?;
            println!("{id}: {status}");
        }
        TaskAction::Subtask {
            task_id,
            subtask_id,
            undo,
        } => {
            store.set_subtask_completed(&task_id, &subtask_id, !undo)?;
            println!("ok");
        }
        TaskAction::Remove { id } => {
            let task = store.remove_task(&id)?;
            println!("removed: {}", task.title);
        }
    }
    Ok(())
}
