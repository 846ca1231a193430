//! Notification entities.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use uuid::Uuid;

use crate::error::AppError;

/// Closed set of events a user can be notified about
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    OrderPlaced,
    OrderStatusChanged,
    OrderCancelled,
    RequestCreated,
    RequestUpdated,
    OfferPublished,
    System,
}

impl NotificationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationKind::OrderPlaced => "order_placed",
            NotificationKind::OrderStatusChanged => "order_status_changed",
            NotificationKind::OrderCancelled => "order_cancelled",
            NotificationKind::RequestCreated => "request_created",
            NotificationKind::RequestUpdated => "request_updated",
            NotificationKind::OfferPublished => "offer_published",
            NotificationKind::System => "system",
        }
    }
}

impl FromStr for NotificationKind {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let kind = match s {
            "order_placed" => NotificationKind::OrderPlaced,
            "order_status_changed" => NotificationKind::OrderStatusChanged,
            "order_cancelled" => NotificationKind::OrderCancelled,
            "request_created" => NotificationKind::RequestCreated,
            "request_updated" => NotificationKind::RequestUpdated,
            "offer_published" => NotificationKind::OfferPublished,
            "system" => NotificationKind::System,
            other => {
                return Err(AppError::validation(format!(
                    "Unknown notification type '{}'",
                    other
                )))
            }
        };
        Ok(kind)
    }
}

/// Stored notification. Only `is_read` ever changes after insert.
#[derive(Debug, Clone, PartialEq)]
pub struct Notification {
    pub id: Uuid,
    pub recipient_id: Uuid,
    pub kind: NotificationKind,
    pub title: String,
    pub message: String,
    pub related_order_id: Option<Uuid>,
    pub related_user_id: Option<Uuid>,
    pub is_read: bool,
    pub metadata: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

/// Notification content before a recipient is attached
#[derive(Debug, Clone, PartialEq)]
pub struct NotificationDraft {
    pub kind: NotificationKind,
    pub title: String,
    pub message: String,
    pub related_order_id: Option<Uuid>,
    pub related_user_id: Option<Uuid>,
    pub metadata: serde_json::Value,
}

impl NotificationDraft {
    pub fn new(kind: NotificationKind, title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind,
            title: title.into(),
            message: message.into(),
            related_order_id: None,
            related_user_id: None,
            metadata: serde_json::Value::Object(Default::default()),
        }
    }

    pub fn related_user(mut self, user_id: Uuid) -> Self {
        self.related_user_id = Some(user_id);
        self
    }

    pub fn metadata(mut self, metadata: serde_json::Value) -> Self {
        self.metadata = metadata;
        self
    }

    pub fn into_notification(self, recipient_id: Uuid) -> Notification {
        Notification {
            id: Uuid::new_v4(),
            recipient_id,
            kind: self.kind,
            title: self.title,
            message: self.message,
            related_order_id: self.related_order_id,
            related_user_id: self.related_user_id,
            is_read: false,
            metadata: self.metadata,
            created_at: Utc::now(),
        }
    }
}
