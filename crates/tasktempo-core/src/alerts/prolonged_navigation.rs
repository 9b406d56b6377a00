//! Alert for wandering around the app without doing anything.
//!
//! "Doing something" means starting a focus session or completing a
//! subtask. Dismissing the alert does not count as an action.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use super::{AlertState, AlertTracker};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProlongedNavigationAlert {
    alert: AlertState,
    last_user_action_at: Option<DateTime<Utc>>,
}

impl ProlongedNavigationAlert {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn last_user_action_at(&self) -> Option<DateTime<Utc>> {
        self.last_user_action_at
    }

    pub fn record_user_action(&mut self, now: DateTime<Utc>) {
        self.last_user_action_at = Some(now);
        self.alert.refresh(false);
    }

    /// Returns true if a dismissal expired during this evaluation. The
    /// first evaluation starts the inactivity clock.
    pub fn evaluate(&mut self, now: DateTime<Utc>, threshold: Duration, dismiss_expiry: Duration) -> bool {
        let since = *self.last_user_action_at.get_or_insert(now);
        let rearmed = self.alert.expire(now, dismiss_expiry);
        self.alert.refresh(now - since >= threshold);
        rearmed
    }
}

impl AlertTracker for ProlongedNavigationAlert {
    fn state(&self) -> &AlertState {
        &self.alert
    }

    fn state_mut(&mut self) -> &mut AlertState {
        &mut self.alert
    }
}
