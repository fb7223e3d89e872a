use reqwest::Client;
use serde::Deserialize;
use uuid::Uuid;

use common::error::{AppError, Res};

use crate::dtos::auth::AuthSession;

/// HTTP client for the GoTrue-style identity provider. Admin calls use
/// the service-role key; user calls carry the caller's access token.
/// Built once at boot and injected into the handlers.
#[derive(Clone)]
pub struct IdentityClient {
    client: Client,
    base_url: String,
    service_role_key: String,
}

#[derive(Debug, Deserialize)]
pub struct CreatedAccount {
    pub id: Uuid,
    pub email: String,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    refresh_token: Option<String>,
    #[serde(default)]
    expires_in: Option<i64>,
    #[serde(default)]
    expires_at: Option<i64>,
    user: Option<IdentityUser>,
}

#[derive(Debug, Deserialize)]
struct IdentityUser {
    id: Uuid,
    #[serde(default)]
    email: Option<String>,
}

impl IdentityClient {
    pub fn new(base_url: String, service_role_key: String) -> Self {
        IdentityClient {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            service_role_key,
        }
    }

    /// Admin-creates a confirmed account, so no verification email goes
    /// out and the user can sign in immediately.
    pub async fn create_account(&self, email: &str, password: &str) -> Res<CreatedAccount> {
        let response = self
            .client
            .post(format!("{}/admin/users", self.base_url))
            .bearer_auth(&self.service_role_key)
            .header("apikey", &self.service_role_key)
            .json(&serde_json::json!({
                "email": email,
                "password": password,
                "email_confirm": true,
            }))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(upstream_failure("Unable to create identity account", response).await);
        }

        response
            .json::<CreatedAccount>()
            .await
            .map_err(AppError::from)
    }

    pub async fn sign_in(&self, email: &str, password: &str) -> Res<AuthSession> {
        let response = self
            .client
            .post(format!("{}/token?grant_type=password", self.base_url))
            .header("apikey", &self.service_role_key)
            .json(&serde_json::json!({ "email": email, "password": password }))
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::validation("Invalid email or password", "auth")
                .with_cause(format!("status {status}: {body}")));
        }

        map_auth_session(response.json::<TokenResponse>().await?)
    }

    /// Grant exchange. Any failure is logged and swallowed because the
    /// session layer treats a missing result as a hard logout.
    pub async fn refresh_access_token(&self, refresh_token: Option<&str>) -> Option<AuthSession> {
        let Some(refresh_token) = refresh_token else {
            log::error!("[auth] refresh requested without a refresh token");
            return None;
        };

        match self.try_refresh(refresh_token).await {
            Ok(auth_session) => Some(auth_session),
            Err(err) => {
                log::error!(
                    "[auth] unable to refresh access token: {}{}",
                    err.message,
                    err.cause
                        .as_deref()
                        .map(|cause| format!(" ({cause})"))
                        .unwrap_or_default()
                );
                None
            }
        }
    }

    async fn try_refresh(&self, refresh_token: &str) -> Res<AuthSession> {
        let response = self
            .client
            .post(format!("{}/token?grant_type=refresh_token", self.base_url))
            .header("apikey", &self.service_role_key)
            .json(&serde_json::json!({ "refresh_token": refresh_token }))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(upstream_failure("Refresh token rejected", response).await);
        }

        map_auth_session(response.json::<TokenResponse>().await?)
    }

    /// Asks the provider whether an access token is still good. Network
    /// trouble counts as invalid; the caller falls back to a refresh.
    pub async fn verify_session(&self, access_token: &str) -> bool {
        let result = self
            .client
            .get(format!("{}/user", self.base_url))
            .header("apikey", &self.service_role_key)
            .bearer_auth(access_token)
            .send()
            .await;

        match result {
            Ok(response) => response.status().is_success(),
            Err(err) => {
                log::error!("[auth] unable to verify access token: {err}");
                false
            }
        }
    }

    pub async fn delete_account(&self, user_id: Uuid) -> Res<()> {
        let response = self
            .client
            .delete(format!("{}/admin/users/{}", self.base_url, user_id))
            .bearer_auth(&self.service_role_key)
            .header("apikey", &self.service_role_key)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(upstream_failure("Unable to delete identity account", response).await);
        }

        Ok(())
    }
}

async fn upstream_failure(message: &str, response: reqwest::Response) -> AppError {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    AppError::upstream(message, "auth").with_cause(format!("status {status}: {body}"))
}

/// Providers may omit the expiry pair; -1 marks them unknown, which the
/// session layer counts as already expired. A session without an email
/// is rejected outright.
fn map_auth_session(payload: TokenResponse) -> Res<AuthSession> {
    let user = payload
        .user
        .ok_or_else(|| AppError::upstream("Identity session has no user", "auth"))?;

    let email = user
        .email
        .filter(|email| !email.is_empty())
        .ok_or_else(|| AppError::upstream("Identity user has no email", "auth"))?;

    Ok(AuthSession {
        access_token: payload.access_token,
        refresh_token: payload.refresh_token.unwrap_or_default(),
        user_id: user.id,
        email,
        expires_in: payload.expires_in.unwrap_or(-1),
        expires_at: payload.expires_at.unwrap_or(-1),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn token_response(json: serde_json::Value) -> TokenResponse {
        serde_json::from_value(json).unwrap()
    }

    #[test]
    fn mapper_defaults_missing_expiries_to_minus_one() {
        let auth = map_auth_session(token_response(serde_json::json!({
            "access_token": "at",
            "refresh_token": "rt",
            "user": { "id": "7f4e1c6e-2b72-4077-9d1c-f925bc28f7d2", "email": "jody@example.com" },
        })))
        .unwrap();

        assert_eq!(auth.expires_in, -1);
        assert_eq!(auth.expires_at, -1);
        assert_eq!(auth.refresh_token, "rt");
    }

    #[test]
    fn mapper_rejects_sessions_without_an_email() {
        let err = map_auth_session(token_response(serde_json::json!({
            "access_token": "at",
            "user": { "id": "7f4e1c6e-2b72-4077-9d1c-f925bc28f7d2" },
        })))
        .expect_err("no email must be rejected");

        assert_eq!(err.message, "Identity user has no email");
    }

    #[test]
    fn mapper_keeps_provider_expiries() {
        let auth = map_auth_session(token_response(serde_json::json!({
            "access_token": "at",
            "refresh_token": "rt",
            "expires_in": 3600,
            "expires_at": 1900000000i64,
            "user": { "id": "7f4e1c6e-2b72-4077-9d1c-f925bc28f7d2", "email": "jody@example.com" },
        })))
        .unwrap();

        assert_eq!(auth.expires_in, 3600);
        assert_eq!(auth.expires_at, 1900000000);
    }
}
