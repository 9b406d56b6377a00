//! Alert for long stretches of focus on a single task.
//!
//! The clock runs from the moment the focus timer became bound to the
//! tracked task and keeps running across consecutive sessions on it,
//! including the gap where a finished session waits for the user to
//! decide what to do next. It restarts only when the focus timer moves to
//! a different task, and clears once focus lets go of every task.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{AlertState, AlertTracker};
use crate::task::TaskId;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExcessiveTimeAlert {
    alert: AlertState,
    tracked_task_id: Option<TaskId>,
    continuous_focus_started_at: Option<DateTime<Utc>>,
}

impl ExcessiveTimeAlert {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn tracked_task_id(&self) -> Option<&str> {
        self.tracked_task_id.as_deref()
    }

    pub fn continuous_focus_started_at(&self) -> Option<DateTime<Utc>> {
        self.continuous_focus_started_at
    }

    pub fn continuous_focus(&self, now: DateTime<Utc>) -> Option<Duration> {
        self.continuous_focus_started_at.map(|since| now - since)
    }

    /// Follow the focus timer's task binding.
    pub fn observe_focus(&mut self, active_task_id: Option<&str>, now: DateTime<Utc>) {
        match active_task_id {
            None => {
                if self.tracked_task_id.is_some() {
                    debug!("focus released, resetting excessive-time tracking");
                    *self = Self::default();
                }
            }
            Some(task_id) if self.tracked_task_id.as_deref() != Some(task_id) => {
                debug!(task_id, "tracking continuous focus");
                self.tracked_task_id = Some(task_id.to_string());
                self.continuous_focus_started_at = Some(now);
            }
            Some(_) => {}
        }
    }

    /// Returns true if a dismissal expired during this evaluation.
    pub fn evaluate(&mut self, now: DateTime<Utc>, threshold: Duration, dismiss_expiry: Duration) -> bool {
        let rearmed = self.alert.expire(now, dismiss_expiry);
        let triggered = self
            .continuous_focus(now)
            .is_some_and(|elapsed| elapsed >= threshold);
        self.alert.refresh(triggered);
        rearmed
    }
}

impl AlertTracker for ExcessiveTimeAlert {
    fn state(&self) -> &AlertState {
        &self.alert
    }

    fn state_mut(&mut self) -> &mut AlertState {
        &mut self.alert
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hour() -> Duration {
        Duration::minutes(60)
    }

    #[test]
    fn fires_after_threshold_on_same_task() {
        let t0 = Utc::now();
        let mut alert = ExcessiveTimeAlert::new();
        alert.observe_focus(Some("a"), t0);

        alert.evaluate(t0 + Duration::minutes(59), hour(), Duration::hours(2));
        assert!(!alert.is_visible());

        alert.evaluate(t0 + Duration::minutes(60), hour(), Duration::hours(2));
        assert!(alert.is_visible());
    }

    #[test]
    fn switching_task_restarts_clock() {
        let t0 = Utc::now();
        let mut alert = ExcessiveTimeAlert::new();
        alert.observe_focus(Some("a"), t0);
        alert.observe_focus(Some("b"), t0 + Duration::minutes(50));
        alert.evaluate(t0 + Duration::minutes(70), hour(), Duration::hours(2));
        assert!(!alert.is_visible());
        assert_eq!(alert.tracked_task_id(), Some("b"));
    }

    #[test]
    fn release_clears_everything() {
        let t0 = Utc::now();
        let mut alert = ExcessiveTimeAlert::new();
        alert.observe_focus(Some("a"), t0);
        alert.dismiss(t0);
        alert.observe_focus(None, t0 + Duration::minutes(5));
        assert_eq!(alert.tracked_task_id(), None);
        assert_eq!(alert.continuous_focus_started_at(), None);
        assert!(!alert.state().is_dismissed());
    }
}
