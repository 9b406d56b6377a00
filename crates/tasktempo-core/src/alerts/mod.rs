//! Cognitive-load alerts.
//!
//! Three independent trackers watch focus activity and user actions and
//! decide whether a banner should be shown:
//!
//! - **Excessive time**: continuous focus on one task past a threshold
//!   (60 min, or 90 min when the configured focus session is long).
//! - **Missing break**: several focus sessions in a row without a break.
//! - **Prolonged navigation**: no meaningful action for 10 minutes.
//!
//! All three share the same dismissal policy: dismissing hides the
//! banner, and after two hours the dismissal lapses so the alert can show
//! again if its condition still holds.

mod dismissal;
mod excessive_time;
mod missing_break;
mod monitor;
mod prolonged_navigation;
mod thresholds;

pub use dismissal::AlertState;
pub use excessive_time::ExcessiveTimeAlert;
pub use missing_break::MissingBreakAlert;
pub use monitor::{AlertMonitor, AlertVisibility};
pub use prolonged_navigation::ProlongedNavigationAlert;
pub use thresholds::AlertThresholds;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertKind {
    ExcessiveTime,
    MissingBreak,
    ProlongedNavigation,
}

impl AlertKind {
    pub const ALL: [AlertKind; 3] = [
        AlertKind::ExcessiveTime,
        AlertKind::MissingBreak,
        AlertKind::ProlongedNavigation,
    ];
}

impl fmt::Display for AlertKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AlertKind::ExcessiveTime => write!(f, "excessive-time"),
            AlertKind::MissingBreak => write!(f, "missing-break"),
            AlertKind::ProlongedNavigation => write!(f, "prolonged-navigation"),
        }
    }
}

impl FromStr for AlertKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "excessive" | "excessive-time" | "excessive_time" => Ok(AlertKind::ExcessiveTime),
            "missing-break" | "missing_break" | "break" => Ok(AlertKind::MissingBreak),
            "inactivity" | "prolonged-navigation" | "prolonged_navigation" => {
                Ok(AlertKind::ProlongedNavigation)
            }
            other => Err(format!("unknown alert: {other}")),
        }
    }
}

/// Shared surface of the three trackers. Each tracker keeps its own
/// trigger logic; visibility and dismissal live in the [`AlertState`].
pub trait AlertTracker {
    fn state(&self) -> &AlertState;

    fn state_mut(&mut self) -> &mut AlertState;

    fn is_visible(&self) -> bool {
        self.state().is_visible()
    }

    fn dismiss(&mut self, now: DateTime<Utc>) {
        self.state_mut().dismiss(now);
    }
}
