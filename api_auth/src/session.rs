use actix_session::Session;
use actix_web::{HttpRequest, HttpResponse};
use chrono::Utc;

use common::{
    error::{AppError, Res},
    http::{redirect, safe_redirect},
};

use crate::{dtos::auth::AuthSession, services::identity::IdentityClient};

pub const SESSION_COOKIE_NAME: &str = "__authSession";
pub const LOGIN_URL: &str = "/login";

pub(crate) const SESSION_KEY: &str = "authenticated";
pub(crate) const SESSION_ERROR_KEY: &str = "error";

pub(crate) const FLASH_NO_USER_SESSION: &str = "no-user-session";
pub(crate) const FLASH_FAIL_REFRESH: &str = "fail-refresh-auth-session";

/// Sessions closer than this to their expiry are refreshed eagerly, so a
/// request in flight cannot race the cutoff.
const REFRESH_ACCESS_TOKEN_THRESHOLD: i64 = 60;

/// Where to send the caller after a successful login when the client
/// asked for nothing specific.
const DEFAULT_AUTHENTICATED_REDIRECT: &str = "/app";

#[derive(Debug, Default, Clone, Copy)]
pub struct RequireAuthOptions<'a> {
    /// Path the login page should send the user back to afterwards.
    /// Defaults to the current request path.
    pub on_failure_redirect_to: Option<&'a str>,
    /// Ask the identity provider to confirm the access token instead of
    /// trusting the cookie contents alone.
    pub verify: bool,
}

/// Reads the auth payload without touching expiry or the provider. An
/// unreadable payload counts as absent.
pub fn get_auth_session(session: &Session) -> Option<AuthSession> {
    session.get::<AuthSession>(SESSION_KEY).ok().flatten()
}

pub fn is_anonymous_session(session: &Session) -> bool {
    get_auth_session(session).is_none()
}

/// One-shot diagnostic left behind by an auth redirect; reading clears it.
pub fn take_flash(session: &Session) -> Option<String> {
    session
        .remove_as::<String>(SESSION_ERROR_KEY)
        .and_then(Result::ok)
}

/// Writes the auth payload and clears any pending flash. The session
/// middleware serializes the mutation into the cookie on the response.
pub fn commit_auth_session(session: &Session, auth_session: &AuthSession) -> Res<()> {
    session.insert(SESSION_KEY, auth_session).map_err(|err| {
        AppError::internal("Unable to write session state", "auth").with_cause(err)
    })?;
    session.remove(SESSION_ERROR_KEY);
    Ok(())
}

/// Fresh login: stores the token bundle and sends the client to its
/// requested in-app destination.
pub fn create_auth_session(
    session: &Session,
    auth_session: &AuthSession,
    redirect_to: Option<&str>,
) -> Res<HttpResponse> {
    commit_auth_session(session, auth_session)?;
    Ok(redirect(&safe_redirect(
        redirect_to,
        DEFAULT_AUTHENTICATED_REDIRECT,
    )))
}

/// Logout. Purging drops the whole session cookie; calling it without a
/// session is harmless.
pub fn destroy_auth_session(session: &Session) -> HttpResponse {
    session.purge();
    redirect("/")
}

/// Gate for protected handlers. Yields the active auth session,
/// refreshing it first when it is about to expire. On any failure the
/// caller gets an auth redirect to the login page carrying a
/// `redirectTo` back to where it came from.
pub async fn require_auth_session(
    req: &HttpRequest,
    session: &Session,
    identity: &IdentityClient,
    options: RequireAuthOptions<'_>,
) -> Res<AuthSession> {
    let redirect_to = options.on_failure_redirect_to.unwrap_or(req.path());

    let Some(auth_session) = get_auth_session(session) else {
        flash(session, FLASH_NO_USER_SESSION);
        return Err(AppError::auth_redirect(
            login_with_redirect(redirect_to),
            "auth",
        ));
    };

    let verified = if options.verify {
        identity.verify_session(&auth_session.access_token).await
    } else {
        true
    };

    if !verified || is_expiring_soon(auth_session.expires_at) {
        return refresh_auth_session(session, identity, redirect_to).await;
    }

    Ok(auth_session)
}

/// Exchanges the refresh token for a new bundle. Failure is terminal:
/// the auth payload is dropped and the caller has to log in again.
async fn refresh_auth_session(
    session: &Session,
    identity: &IdentityClient,
    redirect_to: &str,
) -> Res<AuthSession> {
    let current = get_auth_session(session);
    let refresh_token = current.as_ref().map(|auth| auth.refresh_token.as_str());

    match identity.refresh_access_token(refresh_token).await {
        Some(refreshed) => {
            commit_auth_session(session, &refreshed)?;
            Ok(refreshed)
        }
        None => {
            session.remove(SESSION_KEY);
            flash(session, FLASH_FAIL_REFRESH);
            Err(AppError::auth_redirect(
                login_with_redirect(redirect_to),
                "auth",
            ))
        }
    }
}

fn flash(session: &Session, code: &str) {
    // Serializing a &str cannot fail.
    let _ = session.insert(SESSION_ERROR_KEY, code);
}

fn login_with_redirect(redirect_to: &str) -> String {
    let query = url::form_urlencoded::Serializer::new(String::new())
        .append_pair("redirectTo", redirect_to)
        .finish();
    format!("{LOGIN_URL}?{query}")
}

/// The threshold is applied in seconds, the comparison in milliseconds,
/// against the access token's absolute expiry.
fn is_expiring_soon(expires_at: i64) -> bool {
    (expires_at - REFRESH_ACCESS_TOKEN_THRESHOLD) * 1000 < Utc::now().timestamp_millis()
}

#[cfg(test)]
mod tests {
    use super::*;

    use actix_session::SessionExt;
    use actix_web::http::{StatusCode, header};
    use actix_web::test::TestRequest;
    use uuid::Uuid;

    use common::error::ErrorKind;

    fn auth_session(expires_at: i64) -> AuthSession {
        AuthSession {
            access_token: "access".to_string(),
            refresh_token: "refresh".to_string(),
            user_id: Uuid::new_v4(),
            email: "jody@example.com".to_string(),
            expires_in: 3600,
            expires_at,
        }
    }

    // Nothing listens on port 9, so every provider call fails fast.
    fn unreachable_identity() -> IdentityClient {
        IdentityClient::new(
            "http://127.0.0.1:9".to_string(),
            "service-role-key".to_string(),
        )
    }

    #[test]
    fn expiry_check_applies_the_threshold() {
        let now = Utc::now().timestamp();
        assert!(is_expiring_soon(now - 10));
        assert!(is_expiring_soon(now + 30));
        assert!(!is_expiring_soon(now + 3600));
        assert!(is_expiring_soon(-1));
    }

    #[test]
    fn login_redirect_carries_the_origin_path() {
        assert_eq!(
            login_with_redirect("/app/notes"),
            "/login?redirectTo=%2Fapp%2Fnotes"
        );
    }

    #[actix_web::test]
    async fn missing_session_redirects_to_login_with_flash() {
        let req = TestRequest::with_uri("/app/notes").to_http_request();
        let session = req.get_session();

        let err = require_auth_session(
            &req,
            &session,
            &unreachable_identity(),
            RequireAuthOptions::default(),
        )
        .await
        .expect_err("no session must be rejected");

        match err.kind {
            ErrorKind::AuthRedirect(to) => assert_eq!(to, "/login?redirectTo=%2Fapp%2Fnotes"),
            other => panic!("expected an auth redirect, got {other:?}"),
        }
        assert_eq!(take_flash(&session).as_deref(), Some(FLASH_NO_USER_SESSION));
        // Flash reads are one-shot.
        assert!(take_flash(&session).is_none());
    }

    #[actix_web::test]
    async fn valid_session_is_returned_as_is() {
        let req = TestRequest::with_uri("/app").to_http_request();
        let session = req.get_session();
        let auth = auth_session(Utc::now().timestamp() + 3600);
        commit_auth_session(&session, &auth).unwrap();

        let got = require_auth_session(
            &req,
            &session,
            &unreachable_identity(),
            RequireAuthOptions::default(),
        )
        .await
        .expect("a fresh session must pass");

        assert_eq!(got, auth);
        assert!(take_flash(&session).is_none());
        assert!(!is_anonymous_session(&session));
    }

    #[actix_web::test]
    async fn failed_refresh_is_a_hard_logout() {
        let req = TestRequest::with_uri("/app").to_http_request();
        let session = req.get_session();
        // Inside the refresh threshold, so the gate must try the provider.
        commit_auth_session(&session, &auth_session(Utc::now().timestamp() + 10)).unwrap();

        let err = require_auth_session(
            &req,
            &session,
            &unreachable_identity(),
            RequireAuthOptions::default(),
        )
        .await
        .expect_err("refresh against a dead endpoint must fail");

        assert!(matches!(err.kind, ErrorKind::AuthRedirect(_)));
        assert!(get_auth_session(&session).is_none());
        assert_eq!(take_flash(&session).as_deref(), Some(FLASH_FAIL_REFRESH));
    }

    #[test]
    fn create_session_refuses_external_redirect_targets() {
        let req = TestRequest::default().to_http_request();
        let session = req.get_session();

        let response = create_auth_session(
            &session,
            &auth_session(Utc::now().timestamp() + 3600),
            Some("https://evil.example"),
        )
        .unwrap();

        assert_eq!(response.status(), StatusCode::FOUND);
        assert_eq!(
            response.headers().get(header::LOCATION).unwrap(),
            DEFAULT_AUTHENTICATED_REDIRECT
        );
        assert!(get_auth_session(&session).is_some());
    }

    #[test]
    fn logout_is_idempotent() {
        let req = TestRequest::default().to_http_request();
        let session = req.get_session();
        commit_auth_session(&session, &auth_session(Utc::now().timestamp() + 3600)).unwrap();

        let first = destroy_auth_session(&session);
        assert_eq!(first.status(), StatusCode::FOUND);
        assert_eq!(first.headers().get(header::LOCATION).unwrap(), "/");
        assert!(is_anonymous_session(&session));

        let second = destroy_auth_session(&session);
        assert_eq!(second.status(), StatusCode::FOUND);
    }
}
