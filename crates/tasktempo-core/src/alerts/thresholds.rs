use chrono::Duration;

use crate::storage::AlertConfig;

/// Time and count thresholds for the three alerts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlertThresholds {
    pub excessive_time: Duration,
    /// Used instead of `excessive_time` for users who run long focus sessions.
    pub advanced_excessive_time: Duration,
    /// Focus durations (minutes) above this select the advanced threshold.
    pub advanced_focus_threshold_min: u32,
    pub missing_break_sessions: u32,
    pub prolonged_navigation: Duration,
    pub dismiss_expiry: Duration,
}

impl AlertThresholds {
    pub fn from_config(config: &AlertConfig) -> Self {
        Self {
            excessive_time: Duration::minutes(config.excessive_time_min.into()),
            advanced_excessive_time: Duration::minutes(config.advanced_excessive_time_min.into()),
            advanced_focus_threshold_min: config.advanced_focus_threshold_min,
            missing_break_sessions: config.missing_break_sessions,
            prolonged_navigation: Duration::minutes(config.prolonged_navigation_min.into()),
            dismiss_expiry: Duration::minutes(config.dismiss_expiry_min.into()),
        }
    }

    pub fn excessive_time_for(&self, focus_duration_min: u32) -> Duration {
        if focus_duration_min > self.advanced_focus_threshold_min {
            self.advanced_excessive_time
        } else {
            self.excessive_time
        }
    }
}

impl Default for AlertThresholds {
    fn default() -> Self {
        Self::from_config(&AlertConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let t = AlertThresholds::default();
        assert_eq!(t.missing_break_sessions, 3);
        assert_eq!(t.prolonged_navigation, Duration::minutes(10));
        assert_eq!(t.dismiss_expiry, Duration::hours(2));
    }

    #[test]
    fn advanced_users_get_longer_threshold() {
        let t = AlertThresholds::default();
        assert_eq!(t.excessive_time_for(25), Duration::minutes(60));
        assert_eq!(t.excessive_time_for(26), Duration::minutes(90));
        assert_eq!(t.excessive_time_for(15), Duration::minutes(60));
    }
}
