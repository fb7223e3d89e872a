use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Token bundle kept in the session cookie under the auth key. Field
/// names are camelCase on the wire so the cookie payload and the JSON
/// surface agree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthSession {
    pub access_token: String,
    pub refresh_token: String,
    pub user_id: Uuid,
    pub email: String,
    /// Lifetime of the access token in seconds, -1 when the provider
    /// omitted it.
    pub expires_in: i64,
    /// Unix timestamp the access token dies at. Authoritative for the
    /// refresh decision; -1 (unknown) counts as already expired.
    pub expires_at: i64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinRequest {
    pub email: String,
    pub password: String,
    pub name: String,
    #[serde(default)]
    pub redirect_to: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub redirect_to: Option<String>,
}

/// What the login page needs to know: is there a session, and did a
/// redirect leave a diagnostic behind.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionStatus {
    pub authenticated: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub flash: Option<String>,
}
