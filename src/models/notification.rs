//! In-app notification model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

use super::dates;

/// Kind of system-generated alert
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum NotificationType {
    LoanSlipOverdue,
    Other(String),
}

impl NotificationType {
    pub fn as_str(&self) -> &str {
        match self {
            NotificationType::LoanSlipOverdue => "loan_slip_overdue",
            NotificationType::Other(kind) => kind,
        }
    }

    pub fn label(&self) -> &str {
        match self {
            NotificationType::LoanSlipOverdue => "Loan slip overdue",
            NotificationType::Other(kind) => kind,
        }
    }
}

impl From<&str> for NotificationType {
    fn from(v: &str) -> Self {
        match v {
            "loan_slip_overdue" => NotificationType::LoanSlipOverdue,
            other => NotificationType::Other(other.to_string()),
        }
    }
}

impl Serialize for NotificationType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for NotificationType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(NotificationType::from(raw.as_str()))
    }
}

/// Deep-link target carried by a notification
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationPayload {
    pub entity: String,
    pub action: String,
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extra: Option<Map<String, Value>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    pub id: i64,
    pub recipient_id: i64,
    #[serde(default)]
    pub sender_id: Option<i64>,
    pub title: String,
    #[serde(rename = "type")]
    pub kind: NotificationType,
    pub content: String,
    #[serde(default)]
    pub is_read: bool,
    #[serde(default, with = "dates::timestamp_option")]
    pub read_at: Option<DateTime<Utc>>,
    #[serde(with = "dates::timestamp")]
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<NotificationPayload>,
}

impl Notification {
    /// Apply the read transition; a notification is only ever read once
    pub fn mark_read(&mut self, at: DateTime<Utc>) -> bool {
        if self.is_read {
            return false;
        }
        self.is_read = true;
        self.read_at = Some(at);
        true
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NotificationPage {
    pub items: Vec<Notification>,
    pub total: u64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnreadCount {
    pub unread_count: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarkReadResponse {
    #[serde(default)]
    pub message: String,
}
