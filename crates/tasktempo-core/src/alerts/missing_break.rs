//! Alert for skipping breaks across consecutive focus sessions.
//!
//! Only an explicit "continue focus" choice counts a session. A session
//! that runs out while the user never answers is not counted.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{AlertState, AlertTracker};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MissingBreakAlert {
    alert: AlertState,
    consecutive_focus_sessions: u32,
}

impl MissingBreakAlert {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn consecutive_focus_sessions(&self) -> u32 {
        self.consecutive_focus_sessions
    }

    pub fn record_focus_session_complete(&mut self) {
        self.consecutive_focus_sessions = self.consecutive_focus_sessions.saturating_add(1);
        debug!(
            sessions = self.consecutive_focus_sessions,
            "focus session continued without a break"
        );
    }

    /// A break or a finished task starts the count over, dismissal included.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Returns true if a dismissal expired during this evaluation.
    pub fn evaluate(&mut self, now: DateTime<Utc>, sessions: u32, dismiss_expiry: Duration) -> bool {
        let rearmed = self.alert.expire(now, dismiss_expiry);
        self.alert.refresh(self.consecutive_focus_sessions >= sessions);
        rearmed
    }
}

impl AlertTracker for MissingBreakAlert {
    fn state(&self) -> &AlertState {
        &self.alert
    }

    fn state_mut(&mut self) -> &mut AlertState {
        &mut self.alert
    }
}
