//! Notification model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::trip::TripId;

/// Notification category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    Invitation,
    TripUpdate,
    Reminder,
    #[serde(other)]
    Other,
}

/// A message addressed to the current user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    #[serde(alias = "_id")]
    pub id: String,
    #[serde(rename = "type")]
    pub kind: NotificationKind,
    pub message: String,
    #[serde(default)]
    pub read: bool,
    #[serde(default, alias = "trip")]
    pub trip_id: Option<TripId>,
    pub created_at: DateTime<Utc>,
}

/// Per-user delivery preferences
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationSettings {
    pub email_enabled: bool,
    pub push_enabled: bool,
    /// Days before departure to send a reminder
    pub trip_reminder_days: u32,
}

impl Default for NotificationSettings {
    fn default() -> Self {
        Self {
            email_enabled: true,
            push_enabled: false,
            trip_reminder_days: 3,
        }
    }
}

#[must_use]
pub fn unread_count(notifications: &[Notification]) -> usize {
    notifications.iter().filter(|n| !n.read).count()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_kind_maps_to_other() {
        let raw = r#"{
            "_id": "n1",
            "type": "weather_alert",
            "message": "Storm ahead",
            "createdAt": "2026-05-01T10:00:00Z"
        }"#;
        let notification: Notification = serde_json::from_str(raw).unwrap();
        assert_eq!(notification.kind, NotificationKind::Other);
        assert!(!notification.read);
        assert_eq!(unread_count(&[notification]), 1);
    }

    #[test]
    fn test_settings_default() {
        let settings = NotificationSettings::default();
        assert!(settings.email_enabled);
        assert_eq!(settings.trip_reminder_days, 3);
    }
}
