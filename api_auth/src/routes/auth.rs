use actix_session::Session;
use actix_web::{Responder, post, web};
use sqlx::PgPool;

use common::error::{AppError, Res};

use crate::dtos::auth::{JoinRequest, LoginRequest};
use crate::services::{self, identity::IdentityClient};
use crate::session;

/// Creates an account and opens a session in one step.
///
/// # Input
/// - `payload`: JSON with `email`, `password`, `name` and an optional
///   in-app `redirectTo`
///
/// # Output
/// - Success: 302 to `redirectTo` (default `/app`) with the session
///   cookie set
/// - Error: 403 when the email is already registered, 400 on invalid
///   input
///
/// # Frontend Example
/// ```javascript
/// const response = await fetch('/api/auth/join', {
///   method: 'POST',
///   headers: { 'Content-Type': 'application/json' },
///   credentials: 'include', // Important for receiving the session cookie
///   body: JSON.stringify({
///     email: 'user@example.com',
///     password: 'securepassword',
///     name: 'Jody Example',
///     redirectTo: '/app'
///   }),
///   redirect: 'manual'
/// });
///
/// if (response.status === 302 || response.type === 'opaqueredirect') {
///   window.location.href = '/app';
/// }
/// ```
#[post("/join")]
async fn post_join(
    payload: web::Json<JoinRequest>,
    session: Session,
    pool: web::Data<std::sync::Arc<PgPool>>,
    stripe_client: web::Data<stripe::Client>,
    identity: web::Data<IdentityClient>,
) -> Res<impl Responder> {
    let payload = payload.into_inner();
    validate_join(&payload)?;

    let pg_pool: &PgPool = &**pool;
    if db::user::exists_by_email(pg_pool, &payload.email).await? {
        return Err(
            AppError::forbidden("An account already exists with this email", "auth")
                .with_metadata(serde_json::json!({ "email": payload.email })),
        );
    }

    let auth_session = services::user::create_user_account(
        pg_pool,
        &stripe_client,
        &identity,
        &payload.email,
        &payload.password,
        &payload.name,
    )
    .await?;

    session::create_auth_session(&session, &auth_session, payload.redirect_to.as_deref())
}

/// Signs an existing user in.
///
/// # Input
/// - `payload`: JSON with `email`, `password` and an optional in-app
///   `redirectTo`
///
/// # Output
/// - Success: 302 to `redirectTo` (default `/app`) with the session
///   cookie set
/// - Error: 400 for bad input or rejected credentials
///
/// # Frontend Example
/// ```javascript
/// const response = await fetch('/api/auth/login', {
///   method: 'POST',
///   headers: { 'Content-Type': 'application/json' },
///   credentials: 'include',
///   body: JSON.stringify({
///     email: 'user@example.com',
///     password: 'securepassword'
///   }),
///   redirect: 'manual'
/// });
/// ```
#[post("/login")]
async fn post_login(
    payload: web::Json<LoginRequest>,
    session: Session,
    identity: web::Data<IdentityClient>,
) -> Res<impl Responder> {
    let payload = payload.into_inner();
    validate_login(&payload)?;

    let auth_session = identity.sign_in(&payload.email, &payload.password).await?;

    session::create_auth_session(&session, &auth_session, payload.redirect_to.as_deref())
}

/// Ends the session. Always responds with a 302 to `/`, session or not.
#[post("/logout")]
async fn post_logout(session: Session) -> impl Responder {
    session::destroy_auth_session(&session)
}

fn validate_join(payload: &JoinRequest) -> Res<()> {
    validate_credentials(&payload.email, &payload.password)?;

    if payload.name.trim().is_empty() {
        return Err(AppError::validation("Name is required", "auth")
            .with_metadata(serde_json::json!({ "field": "name" })));
    }

    Ok(())
}

fn validate_login(payload: &LoginRequest) -> Res<()> {
    validate_credentials(&payload.email, &payload.password)
}

fn validate_credentials(email: &str, password: &str) -> Res<()> {
    if !email.contains('@') || email.trim().is_empty() {
        return Err(AppError::validation("Invalid email", "auth")
            .with_metadata(serde_json::json!({ "field": "email" })));
    }

    if password.len() < 8 {
        return Err(
            AppError::validation("Password must be at least 8 characters", "auth")
                .with_metadata(serde_json::json!({ "field": "password" })),
        );
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn join(email: &str, password: &str, name: &str) -> JoinRequest {
        JoinRequest {
            email: email.to_string(),
            password: password.to_string(),
            name: name.to_string(),
            redirect_to: None,
        }
    }

    #[test]
    fn join_payloads_are_validated() {
        assert!(validate_join(&join("jody@example.com", "longenough", "Jody")).is_ok());
        assert!(validate_join(&join("not-an-email", "longenough", "Jody")).is_err());
        assert!(validate_join(&join("jody@example.com", "short", "Jody")).is_err());
        assert!(validate_join(&join("jody@example.com", "longenough", "  ")).is_err());
    }

    #[test]
    fn password_errors_never_echo_the_password() {
        let err = validate_credentials("jody@example.com", "short").unwrap_err();
        let metadata = err.metadata.unwrap();
        assert_eq!(metadata, serde_json::json!({ "field": "password" }));
    }
}
