//! Short-lived user-facing messages.

use std::fmt;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// How long a notification stays visible.
pub const NOTIFICATION_TTL: Duration = Duration::seconds(5);

/// Severity of a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    /// The action succeeded.
    Success,
    /// The action failed.
    Error,
    /// Something needs attention.
    Warning,
    /// Neutral information.
    Info,
}

impl fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Success => write!(f, "success"),
            Self::Error => write!(f, "error"),
            Self::Warning => write!(f, "warning"),
            Self::Info => write!(f, "info"),
        }
    }
}

/// A visible message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    /// Identifier, unique within one [`NotificationCenter`].
    pub id: u64,
    /// Message text.
    pub message: String,
    /// Severity.
    pub kind: NotificationKind,
    /// When the message was shown.
    pub timestamp: DateTime<Utc>,
}

impl Notification {
    /// Whether the message has outlived [`NOTIFICATION_TTL`] at `now`.
    #[must_use]
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now - self.timestamp >= NOTIFICATION_TTL
    }
}

/// The list of currently visible notifications.
#[derive(Debug, Clone)]
pub struct NotificationCenter {
    enabled: bool,
    next_id: u64,
    entries: Vec<Notification>,
}

impl Default for NotificationCenter {
    fn default() -> Self {
        Self::new(true)
    }
}

impl NotificationCenter {
    /// Create an empty center.
    #[must_use]
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            next_id: 1,
            entries: Vec::new(),
        }
    }

    /// Whether new notifications are accepted.
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Turn notifications on or off. Turning them off hides what is showing.
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
        if !enabled {
            self.entries.clear();
        }
    }

    /// Show a message.
    ///
    /// Returns `None` without recording anything when notifications are
    /// disabled. Messages already expired at `now` are dropped first.
    pub fn show(
        &mut self,
        message: impl Into<String>,
        kind: NotificationKind,
        now: DateTime<Utc>,
    ) -> Option<Notification> {
        if !self.enabled {
            return None;
        }
        self.entries.retain(|n| !n.is_expired(now));
        let notification = Notification {
            id: self.next_id,
            message: message.into(),
            kind,
            timestamp: now,
        };
        self.next_id += 1;
        self.entries.push(notification.clone());
        Some(notification)
    }

    /// Drop expired messages and return the rest, oldest first.
    pub fn active(&mut self, now: DateTime<Utc>) -> &[Notification] {
        self.entries.retain(|n| !n.is_expired(now));
        &self.entries
    }

    /// Remove a message early. Returns `false` if it was already gone.
    pub fn dismiss(&mut self, id: u64) -> bool {
        let before = self.entries.len();
        self.entries.retain(|n| n.id != id);
        self.entries.len() != before
    }

    /// Remove every message.
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t0() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2025-10-25T10:00:00Z")
            .unwrap()
            .with_timezone(&Utc)
    }

    #[test]
    fn test_show_assigns_increasing_ids() {
        let mut center = NotificationCenter::default();
        let a = center.show("one", NotificationKind::Info, t0()).unwrap();
        let b = center.show("two", NotificationKind::Error, t0()).unwrap();
        assert!(b.id > a.id);
        assert_eq!(center.active(t0()).len(), 2);
    }

    #[test]
    fn test_disabled_center_ignores_show() {
        let mut center = NotificationCenter::new(false);
        assert!(center.show("hidden", NotificationKind::Success, t0()).is_none());
        assert!(center.active(t0()).is_empty());
    }

    #[test]
    fn test_expiry_after_five_seconds() {
        let mut center = NotificationCenter::default();
        center.show("short", NotificationKind::Success, t0());

        assert_eq!(center.active(t0() + Duration::milliseconds(4999)).len(), 1);
        assert!(center.active(t0() + Duration::seconds(5)).is_empty());
    }

    #[test]
    fn test_show_drops_expired_entries() {
        let mut center = NotificationCenter::default();
        for i in 0..100 {
            center.show("tick", NotificationKind::Success, t0() + Duration::seconds(i * 10));
        }
        assert_eq!(center.entries.len(), 1);

        center.show("soon", NotificationKind::Info, t0() + Duration::seconds(992));
        assert_eq!(center.entries.len(), 2);
    }

    #[test]
    fn test_dismiss() {
        let mut center = NotificationCenter::default();
        let n = center.show("bye", NotificationKind::Warning, t0()).unwrap();
        assert!(center.dismiss(n.id));
        assert!(!center.dismiss(n.id));
    }

    #[test]
    fn test_disabling_clears() {
        let mut center = NotificationCenter::default();
        center.show("x", NotificationKind::Info, t0());
        center.set_enabled(false);
        assert!(center.active(t0()).is_empty());
        assert!(!center.is_enabled());
    }

    #[test]
    fn test_clear() {
        let mut center = NotificationCenter::default();
        center.show("x", NotificationKind::Info, t0());
        center.show("y", NotificationKind::Info, t0());
        center.clear();
        assert!(center.active(t0()).is_empty());
    }

    #[test]
    fn test_kind_display_and_serde() {
        assert_eq!(NotificationKind::Warning.to_string(), "warning");
        assert_eq!(
            serde_json::to_string(&NotificationKind::Success).unwrap(),
            "\"success\""
        );
    }
}
