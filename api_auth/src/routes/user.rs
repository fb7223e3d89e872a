use actix_session::Session;
use actix_web::{HttpRequest, Responder, delete, web};
use sqlx::PgPool;

use common::error::Res;

use crate::services::{self, identity::IdentityClient};
use crate::session::{self, RequireAuthOptions};

/// Deletes the caller's account everywhere: billing customer, identity
/// account, local data (notes and subscription go with the user row).
/// The session is destroyed last.
///
/// # Output
/// - Success: 302 to `/` with the session cookie dropped
/// - Error: auth redirect when no session, 500 when a provider call
///   fails (account left intact for retry)
#[delete("/account")]
async fn delete_account(
    req: HttpRequest,
    session: Session,
    pool: web::Data<std::sync::Arc<PgPool>>,
    stripe_client: web::Data<stripe::Client>,
    identity: web::Data<IdentityClient>,
) -> Res<impl Responder> {
    let auth =
        session::require_auth_session(&req, &session, &identity, RequireAuthOptions::default())
            .await?;

    let pg_pool: &PgPool = &**pool;
    services::user::delete_user(pg_pool, &stripe_client, &identity, auth.user_id).await?;

    Ok(session::destroy_auth_session(&session))
}
