//! Visibility and dismiss/expiry bookkeeping shared by every alert.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Visibility of one alert plus its dismissal.
///
/// `dismissed_at` doubles as the dismissed flag, so "dismissed" and
/// "has a dismissal time" cannot disagree. A dismissed alert is never
/// visible.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlertState {
    visible: bool,
    dismissed_at: Option<DateTime<Utc>>,
}

impl AlertState {
    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn is_dismissed(&self) -> bool {
        self.dismissed_at.is_some()
    }

    pub fn dismissed_at(&self) -> Option<DateTime<Utc>> {
        self.dismissed_at
    }

    pub fn dismiss(&mut self, now: DateTime<Utc>) {
        self.visible = false;
        self.dismissed_at = Some(now);
    }

    /// Lift a dismissal that is at least `window` old. Returns true if one
    /// was lifted. Whether the alert shows again is decided by the next
    /// [`refresh`](Self::refresh).
    pub fn expire(&mut self, now: DateTime<Utc>, window: Duration) -> bool {
        match self.dismissed_at {
            Some(at) if now - at >= window => {
                self.dismissed_at = None;
                true
            }
            _ => false,
        }
    }

    /// Recompute visibility from the tracker's trigger condition.
    pub fn refresh(&mut self, triggered: bool) {
        self.visible = triggered && !self.is_dismissed();
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
