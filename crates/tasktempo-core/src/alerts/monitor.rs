//! Owns the three alert trackers and turns their visibility changes into
//! events.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{
    AlertKind, AlertThresholds, AlertTracker, ExcessiveTimeAlert, MissingBreakAlert,
    ProlongedNavigationAlert,
};
use crate::events::Event;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlertVisibility {
    pub excessive_time: bool,
    pub missing_break: bool,
    pub prolonged_navigation: bool,
}

impl AlertVisibility {
    pub fn get(&self, kind: AlertKind) -> bool {
        match kind {
            AlertKind::ExcessiveTime => self.excessive_time,
            AlertKind::MissingBreak => self.missing_break,
            AlertKind::ProlongedNavigation => self.prolonged_navigation,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AlertMonitor {
    thresholds: AlertThresholds,
    excessive_time: ExcessiveTimeAlert,
    missing_break: MissingBreakAlert,
    prolonged_navigation: ProlongedNavigationAlert,
}

impl AlertMonitor {
    pub fn new(thresholds: AlertThresholds) -> Self {
        Self {
            thresholds,
            excessive_time: ExcessiveTimeAlert::new(),
            missing_break: MissingBreakAlert::new(),
            prolonged_navigation: ProlongedNavigationAlert::new(),
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn set_thresholds(&mut self, thresholds: AlertThresholds) {
        self.thresholds = thresholds;
    }

    pub fn excessive_time(&self) -> &ExcessiveTimeAlert {
        &self.excessive_time
    }

    pub fn missing_break(&self) -> &MissingBreakAlert {
        &self.missing_break
    }

    pub fn prolonged_navigation(&self) -> &ProlongedNavigationAlert {
        &self.prolonged_navigation
    }

    pub fn visibility(&self) -> AlertVisibility {
        AlertVisibility {
            excessive_time: self.excessive_time.is_visible(),
            missing_break: self.missing_break.is_visible(),
            prolonged_navigation: self.prolonged_navigation.is_visible(),
        }
    }

    pub fn is_excessive_time_alert_visible(&self) -> bool {
        self.excessive_time.is_visible()
    }

    pub fn is_missing_break_alert_visible(&self) -> bool {
        self.missing_break.is_visible()
    }

    pub fn is_prolonged_navigation_alert_visible(&self) -> bool {
        self.prolonged_navigation.is_visible()
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Re-evaluate every tracker: follow the focus binding, lift expired
    /// dismissals, recompute visibility. Runs on the periodic alert tick
    /// and after every relevant state change.
    pub fn evaluate(
        &mut self,
        focus_task_id: Option<&str>,
        focus_duration_min: u32,
        now: DateTime<Utc>,
    ) -> Vec<Event> {
        let before = self.visibility();
        let expiry = self.thresholds.dismiss_expiry;
        let mut rearmed = Vec::new();

        self.excessive_time.observe_focus(focus_task_id, now);
        let threshold = self.thresholds.excessive_time_for(focus_duration_min);
        if self.excessive_time.evaluate(now, threshold, expiry) {
            rearmed.push(AlertKind::ExcessiveTime);
        }
        if self
            .missing_break
            .evaluate(now, self.thresholds.missing_break_sessions, expiry)
        {
            rearmed.push(AlertKind::MissingBreak);
        }
        if self
            .prolonged_navigation
            .evaluate(now, self.thresholds.prolonged_navigation, expiry)
        {
            rearmed.push(AlertKind::ProlongedNavigation);
        }

        let mut events: Vec<Event> = rearmed
            .into_iter()
            .map(|alert| Event::AlertRearmed { alert, at: now })
            .collect();
        events.extend(self.edges(before, now));
        events
    }

    pub fn dismiss(&mut self, kind: AlertKind, now: DateTime<Utc>) -> Vec<Event> {
        let tracker: &mut dyn AlertTracker = match kind {
            AlertKind::ExcessiveTime => &mut self.excessive_time,
            AlertKind::MissingBreak => &mut self.missing_break,
            AlertKind::ProlongedNavigation => &mut self.prolonged_navigation,
        };
        tracker.dismiss(now);
        debug!(alert = %kind, "alert dismissed");
        vec![Event::AlertDismissed { alert: kind, at: now }]
    }

    pub fn record_focus_session_complete(&mut self, now: DateTime<Utc>) -> Vec<Event> {
        let before = self.visibility();
        self.missing_break.record_focus_session_complete();
        self.missing_break.evaluate(
            now,
            self.thresholds.missing_break_sessions,
            self.thresholds.dismiss_expiry,
        );
        self.edges(before, now)
    }

    pub fn record_break_complete(&mut self, now: DateTime<Utc>) -> Vec<Event> {
        let before = self.visibility();
        self.missing_break.reset();
        self.edges(before, now)
    }

    pub fn record_task_finished(&mut self, now: DateTime<Utc>) -> Vec<Event> {
        let before = self.visibility();
        self.missing_break.reset();
        self.edges(before, now)
    }

    pub fn record_user_action(&mut self, now: DateTime<Utc>) -> Vec<Event> {
        let before = self.visibility();
        self.prolonged_navigation.record_user_action(now);
        self.edges(before, now)
    }

    fn edges(&self, before: AlertVisibility, now: DateTime<Utc>) -> Vec<Event> {
        let after = self.visibility();
        AlertKind::ALL
            .into_iter()
            .filter(|kind| before.get(*kind) != after.get(*kind))
            .map(|alert| {
                if after.get(alert) {
                    debug!(%alert, "alert shown");
                    Event::AlertShown { alert, at: now }
                } else {
                    debug!(%alert, "alert hidden");
                    Event::AlertHidden { alert, at: now }
                }
            })
            .collect()
    }
}

impl Default for AlertMonitor {
    fn default() -> Self {
        Self::new(AlertThresholds::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn visibility_edges_are_reported_once() {
        let t0 = Utc::now();
        let mut monitor = AlertMonitor::default();
        monitor.record_user_action(t0);

        let events = monitor.evaluate(None, 25, t0 + Duration::minutes(10));
        assert!(matches!(
            events.as_slice(),
            [Event::AlertShown {
                alert: AlertKind::ProlongedNavigation,
                ..
            }]
        ));

        assert!(monitor.evaluate(None, 25, t0 + Duration::minutes(11)).is_empty());

        let events = monitor.record_user_action(t0 + Duration::minutes(12));
        assert!(matches!(
            events.as_slice(),
            [Event::AlertHidden {
                alert: AlertKind::ProlongedNavigation,
                ..
            }]
        ));
    }

    #[test]
    fn dismissal_rearms_after_expiry() {
        let t0 = Utc::now();
        let mut monitor = AlertMonitor::default();
        for _ in 0..3 {
            monitor.record_focus_session_complete(t0);
        }
        assert!(monitor.is_missing_break_alert_visible());

        monitor.dismiss(AlertKind::MissingBreak, t0);
        assert!(!monitor.is_missing_break_alert_visible());

        monitor.evaluate(None, 25, t0 + Duration::minutes(119));
        assert!(!monitor.is_missing_break_alert_visible());

        let events = monitor.evaluate(None, 25, t0 + Duration::hours(2));
        assert!(monitor.is_missing_break_alert_visible());
        assert!(events
            .iter()
            .any(|e| matches!(e, Event::AlertRearmed { alert: AlertKind::MissingBreak, .. })));
    }

    #[test]
    fn long_focus_setting_uses_advanced_threshold() {
        let t0 = Utc::now();
        let mut monitor = AlertMonitor::default();
        monitor.evaluate(Some("a"), 50, t0);
        monitor.evaluate(Some("a"), 50, t0 + Duration::minutes(75));
        assert!(!monitor.is_excessive_time_alert_visible());
        monitor.evaluate(Some("a"), 50, t0 + Duration::minutes(90));
        assert!(monitor.is_excessive_time_alert_visible());
    }
}
