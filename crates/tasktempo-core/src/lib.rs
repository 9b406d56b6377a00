//! # Tasktempo Core Library
//!
//! Focus/break countdowns bound to tasks, three cognitive-load alerts, and
//! the decision raised when a session ends. The CLI is a thin layer over
//! this crate.
//!
//! ## Architecture
//!
//! - **Timers**: one generic countdown machine, specialised as a focus
//!   timer (returns to idle when done) and a break timer (holds "ended").
//!   Countdown is tick-driven: each tick is one second.
//! - **Alerts**: excessive time on one task, missing breaks, and prolonged
//!   navigation without action. Each can be dismissed; dismissals expire.
//! - **Session**: completion detection, decisions, and the coordinator that
//!   owns all of the above.
//! - **Storage**: TOML configuration and a JSON task file.
//!
//! ## Key Components
//!
//! - [`FocusCoordinator`]: the single owner of session state
//! - [`SessionDriver`]: async ticker pump around the coordinator
//! - [`TaskStore`]: the task collaborator seam
//! - [`Config`]: application configuration management

pub mod alerts;
pub mod clock;
pub mod error;
pub mod events;
pub mod session;
pub mod storage;
pub mod task;
pub mod ticker;
pub mod timer;

pub use alerts::{AlertKind, AlertMonitor, AlertThresholds, AlertVisibility};
pub use clock::{Clock, ManualClock, SystemClock};
pub use error::{ConfigError, CoreError, DecisionError, TaskError};
pub use events::{Event, Snapshot};
pub use session::{
    AlertBanner, BreakChoice, DecisionChoice, DecisionRequest, DriverTick, FocusChoice,
    FocusCoordinator, SessionDriver,
};
pub use storage::{Config, FileTaskStore, SettingsSource, SharedSettings};
pub use task::{InMemoryTaskStore, Task, TaskChange, TaskId, TaskStatus, TaskStore};
pub use ticker::Ticker;
pub use timer::{SessionPhase, SessionState, TimerKind};
