mod break_timer;
mod focus;
pub mod session;
mod sync_guard;

pub use break_timer::BreakTimerEngine;
pub use focus::FocusTimerEngine;
pub use session::{SessionCommand, SessionPhase, SessionState, SessionTimer, TerminalPolicy};
pub use sync_guard::{ForceStopReason, TimerTaskSyncGuard};

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimerKind {
    Focus,
    Break,
}
