use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use super::models::{RequestStatus, SupportRequest};

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SupportRequestResponse {
    pub id: Uuid,
    pub user_id: Uuid,
    pub subject: String,
    pub message: String,
    pub contact_email: Option<String>,
    pub contact_phone: Option<String>,
    pub status: RequestStatus,
    pub admin_response: Option<String>,
    pub responded_by: Option<Uuid>,
    pub responded_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<SupportRequest> for SupportRequestResponse {
    fn from(r: SupportRequest) -> Self {
        Self {
            id: r.id,
            user_id: r.requester_id,
            subject: r.subject,
            message: r.message,
            contact_email: r.contact_email,
            contact_phone: r.contact_phone,
            status: r.status,
            admin_response: r.admin_response,
            responded_by: r.responded_by,
            responded_at: r.responded_at,
            created_at: r.created_at,
            updated_at: r.updated_at,
        }
    }
}
