//! Dashboard change events.
//!
//! Views subscribe explicitly and receive every event emitted after they
//! subscribed. Dropped receivers are pruned on the next emit.

use std::fmt;

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::trace;

use crate::notify::NotificationKind;

/// Something a view may need to react to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AppEvent {
    /// The location set changed.
    LocationsUpdated,
    /// A recommendation band was edited.
    RecommendationsUpdated,
    /// A user-facing message should be shown.
    ShowNotification {
        /// Message text.
        message: String,
        /// Message severity.
        kind: NotificationKind,
    },
    /// System settings changed.
    SettingsUpdated,
    /// An operator logged in or out.
    SessionChanged,
}

impl fmt::Display for AppEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::LocationsUpdated => write!(f, "locations updated"),
            Self::RecommendationsUpdated => write!(f, "recommendations updated"),
            Self::ShowNotification { message, kind } => write!(f, "[{kind}] {message}"),
            Self::SettingsUpdated => write!(f, "settings updated"),
            Self::SessionChanged => write!(f, "session changed"),
        }
    }
}

/// Fan-out of [`AppEvent`]s to subscribers.
#[derive(Debug, Default)]
pub struct EventBus {
    subscribers: Vec<mpsc::UnboundedSender<AppEvent>>,
}

impl EventBus {
    /// Create a bus with no subscribers.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new subscriber.
    pub fn subscribe(&mut self) -> mpsc::UnboundedReceiver<AppEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.subscribers.push(tx);
        rx
    }

    /// Deliver `event` to every live subscriber.
    pub fn emit(&mut self, event: AppEvent) {
        trace!("Emitting event: {event}");
        self.subscribers.retain(|tx| tx.send(event.clone()).is_ok());
    }

    /// Number of live subscribers as of the last emit.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_emit_reaches_all_subscribers() {
        let mut bus = EventBus::new();
        let mut first = bus.subscribe();
        let mut second = bus.subscribe();

        bus.emit(AppEvent::LocationsUpdated);

        assert_eq!(first.try_recv().unwrap(), AppEvent::LocationsUpdated);
        assert_eq!(second.try_recv().unwrap(), AppEvent::LocationsUpdated);
    }

    #[test]
    fn test_late_subscriber_misses_earlier_events() {
        let mut bus = EventBus::new();
        bus.emit(AppEvent::SettingsUpdated);

        let mut rx = bus.subscribe();
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_dropped_subscriber_pruned() {
        let mut bus = EventBus::new();
        let rx = bus.subscribe();
        let _kept = bus.subscribe();
        drop(rx);

        bus.emit(AppEvent::SessionChanged);
        assert_eq!(bus.subscriber_count(), 1);
    }

    #[test]
    fn test_display() {
        let event = AppEvent::ShowNotification {
            message: "Data refreshed successfully".to_string(),
            kind: NotificationKind::Success,
        };
        assert_eq!(event.to_string(), "[success] Data refreshed successfully");
    }

    #[test]
    fn test_serialize_tagged() {
        let json = serde_json::to_value(AppEvent::ShowNotification {
            message: "x".to_string(),
            kind: NotificationKind::Error,
        })
        .unwrap();
        assert_eq!(json["type"], "show_notification");
        assert_eq!(json["kind"], "error");
    }
}
