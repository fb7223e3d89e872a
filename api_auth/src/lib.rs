use actix_session::{
    SessionMiddleware,
    config::{CookieContentSecurity, PersistentSession, TtlExtensionPolicy},
    storage::CookieSessionStore,
};
use actix_web::{
    Scope,
    cookie::{Key, SameSite, time::Duration},
    web,
};

pub mod session;

pub mod dtos {
    pub mod auth;
}
pub mod services {
    pub mod identity;
    pub mod user;
}
pub mod routes {
    pub mod auth;
    pub mod session;
    pub mod user;
}

/// Session cookie layer. Registered last on the App so it wraps every
/// other middleware and turns handler session mutations into Set-Cookie
/// headers on the way out.
///
/// The cookie is encrypted and signed, scoped to the whole site, only
/// sent over HTTP (no script access) and slides its 7 day lifetime on
/// every request.
pub fn session_middleware(
    cookie_secure: bool,
    secret: &[u8],
) -> SessionMiddleware<CookieSessionStore> {
    SessionMiddleware::builder(CookieSessionStore::default(), Key::derive_from(secret))
        .cookie_name(session::SESSION_COOKIE_NAME.to_string())
        .cookie_http_only(true)
        .cookie_path("/".to_string())
        .cookie_same_site(SameSite::Lax)
        .cookie_secure(cookie_secure)
        .cookie_content_security(CookieContentSecurity::Private)
        .session_lifecycle(
            PersistentSession::default()
                .session_ttl(Duration::days(7))
                .session_ttl_extension_policy(TtlExtensionPolicy::OnEveryRequest),
        )
        .build()
}

pub fn mount_auth() -> Scope {
    web::scope("/auth")
        .service(routes::auth::post_join)
        .service(routes::auth::post_login)
        .service(routes::auth::post_logout)
        .service(routes::session::get_session)
        .service(routes::user::delete_account)
}
