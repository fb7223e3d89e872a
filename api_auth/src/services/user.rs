use sqlx::PgPool;
use uuid::Uuid;

use common::{
    error::{AppError, Res},
    stripe as billing,
};
use db::{
    dtos::user::NewUser,
    models::{
        tier::{Tier, TierLimit},
        user::BillingInfo,
    },
};

use crate::{dtos::auth::AuthSession, services::identity::IdentityClient};

/// Provisions everything a new account needs: identity-provider user,
/// billing customer, local row on the free tier. When a later step
/// fails the identity account is deleted again so the email can retry
/// cleanly.
pub async fn create_user_account(
    pool: &PgPool,
    stripe_client: &stripe::Client,
    identity: &IdentityClient,
    email: &str,
    password: &str,
    name: &str,
) -> Res<AuthSession> {
    let account = identity.create_account(email, password).await?;

    let auth_session = match identity.sign_in(email, password).await {
        Ok(auth_session) => auth_session,
        Err(err) => {
            cleanup_identity_account(identity, account.id).await;
            return Err(err);
        }
    };

    if let Err(err) = provision_user(pool, stripe_client, account.id, email, name).await {
        cleanup_identity_account(identity, account.id).await;
        return Err(err);
    }

    Ok(auth_session)
}

async fn provision_user(
    pool: &PgPool,
    stripe_client: &stripe::Client,
    user_id: Uuid,
    email: &str,
    name: &str,
) -> Res<()> {
    let customer = billing::create_customer(stripe_client, email, name).await?;

    db::user::insert(
        pool,
        &NewUser {
            id: user_id,
            email: email.to_string(),
            name: name.to_string(),
            customer_id: customer.id.to_string(),
        },
    )
    .await?;

    Ok(())
}

async fn cleanup_identity_account(identity: &IdentityClient, account_id: Uuid) {
    if let Err(err) = identity.delete_account(account_id).await {
        log::error!(
            "[user] orphaned identity account {account_id}: {}",
            err.message
        );
    }
}

pub async fn get_billing_info(pool: &PgPool, user_id: Uuid) -> Res<BillingInfo> {
    db::user::get_billing_info(pool, user_id)
        .await?
        .ok_or_else(|| AppError::not_found("User has no billing profile", "user"))
}

pub async fn get_user_tier(pool: &PgPool, user_id: Uuid) -> Res<Tier> {
    db::user::get_tier(pool, user_id)
        .await?
        .ok_or_else(|| AppError::not_found("User has no tier", "user"))
}

pub async fn get_user_tier_limit(pool: &PgPool, user_id: Uuid) -> Res<TierLimit> {
    db::user::get_tier_limit(pool, user_id)
        .await?
        .ok_or_else(|| AppError::not_found("User tier has no limits", "user"))
}

/// Full account teardown across the three systems. Provider-side
/// resources go first; if one of those calls fails the local row stays,
/// so the operation can be retried.
pub async fn delete_user(
    pool: &PgPool,
    stripe_client: &stripe::Client,
    identity: &IdentityClient,
    user_id: Uuid,
) -> Res<()> {
    let billing_info = get_billing_info(pool, user_id).await?;

    billing::delete_customer(stripe_client, &billing_info.customer_id).await?;
    identity.delete_account(user_id).await?;
    db::user::delete(pool, user_id).await
}
