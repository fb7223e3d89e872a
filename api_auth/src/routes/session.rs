use actix_session::Session;
use actix_web::{Responder, get};

use common::{error::Res, http::Success};

use crate::dtos::auth::SessionStatus;
use crate::session;

/// Lightweight probe for the login page: reports whether a session
/// exists and surfaces the one-shot diagnostic left by an auth
/// redirect. Never refreshes and never calls the identity provider.
///
/// # Output
/// - `{ authenticated, userId?, email?, expiresAt?, flash? }`
///
/// # Frontend Example
/// ```javascript
/// const response = await fetch('/api/auth/session', { credentials: 'include' });
/// const { data } = await response.json();
/// if (data.authenticated) {
///   window.location.href = '/app'; // already signed in, skip the form
/// } else if (data.flash) {
///   showBanner(data.flash); // e.g. "fail-refresh-auth-session"
/// }
/// ```
#[get("/session")]
async fn get_session(session: Session) -> Res<impl Responder> {
    let flash = session::take_flash(&session);

    let status = match session::get_auth_session(&session) {
        Some(auth) => SessionStatus {
            authenticated: true,
            user_id: Some(auth.user_id),
            email: Some(auth.email),
            expires_at: Some(auth.expires_at),
            flash,
        },
        None => SessionStatus {
            authenticated: false,
            user_id: None,
            email: None,
            expires_at: None,
            flash,
        },
    };

    Success::ok(status)
}

#[cfg(test)]
mod tests {
    use actix_web::{App, test, web};

    use crate::dtos::auth::AuthSession;
    use crate::session::{commit_auth_session, take_flash};

    use actix_session::SessionExt;

    #[actix_web::test]
    async fn session_status_reports_anonymous_without_a_cookie() {
        let app = test::init_service(
            App::new().service(web::scope("/auth").service(super::get_session)),
        )
        .await;

        let response =
            test::call_service(&app, test::TestRequest::get().uri("/auth/session").to_request())
                .await;
        assert!(response.status().is_success());

        let body: serde_json::Value = test::read_body_json(response).await;
        assert_eq!(body["data"]["authenticated"], false);
        assert!(body["data"].get("userId").is_none());
        assert!(body["error"].is_null());
    }

    #[actix_web::test]
    async fn session_status_round_trips_the_auth_payload() {
        let req = test::TestRequest::default().to_http_request();
        let session = req.get_session();

        let auth = AuthSession {
            access_token: "access".to_string(),
            refresh_token: "refresh".to_string(),
            user_id: uuid::Uuid::new_v4(),
            email: "jody@example.com".to_string(),
            expires_in: 3600,
            expires_at: 1900000000,
        };
        commit_auth_session(&session, &auth).unwrap();

        // The status endpoint reads exactly what the commit wrote.
        let stored = crate::session::get_auth_session(&session).unwrap();
        assert_eq!(stored.email, "jody@example.com");
        assert_eq!(stored.expires_at, 1900000000);
        assert!(take_flash(&session).is_none());
    }
}
