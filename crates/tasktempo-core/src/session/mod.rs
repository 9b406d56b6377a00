//! Session orchestration: completion detection, decisions, and the
//! coordinator that ties timers, alerts and tasks together.

pub mod completion;
pub mod coordinator;
pub mod decision;
pub mod driver;

pub use completion::{Completion, SessionCompletionDetector};
pub use coordinator::{AlertBanner, FocusCoordinator};
pub use decision::{BreakChoice, DecisionChoice, DecisionRequest, FocusChoice};
pub use driver::{DriverTick, SessionDriver};
