use serde::Deserialize;

use super::models::RequestStatus;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSupportRequest {
    pub subject: Option<String>,
    pub message: Option<String>,
    pub contact_email: Option<String>,
    pub contact_phone: Option<String>,
}

/// Admin update: new status and/or a response to the requester
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateSupportRequest {
    pub status: Option<RequestStatus>,
    pub admin_response: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct StatusFilter {
    pub status: Option<RequestStatus>,
}
