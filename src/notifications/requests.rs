use serde::Deserialize;
use uuid::Uuid;

/// Admin-authored notification. Exactly one of `recipientId` or `toAdmins`.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendNotificationRequest {
    pub recipient_id: Option<Uuid>,
    #[serde(default)]
    pub to_admins: bool,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub title: Option<String>,
    pub message: Option<String>,
    pub related_order_id: Option<Uuid>,
    pub related_user_id: Option<Uuid>,
    pub metadata: Option<serde_json::Value>,
}
