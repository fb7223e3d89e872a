use common::error::{AppError, Res};
use sqlx::{Executor, Postgres};
use uuid::Uuid;

use crate::{
    dtos::user::NewUser,
    models::{
        tier::{Tier, TierLimit},
        user::{BillingInfo, User},
    },
};

pub async fn exists_by_email<'e, E: Executor<'e, Database = Postgres>>(
    executor: E,
    email: &str,
) -> Res<bool> {
    sqlx::query_scalar::<_, bool>("SELECT EXISTS (SELECT 1 FROM users WHERE email = $1)")
        .bind(email)
        .fetch_one(executor)
        .await
        .map_err(AppError::from)
}

pub async fn get_by_id<'e, E: Executor<'e, Database = Postgres>>(
    executor: E,
    user_id: Uuid,
) -> Res<Option<User>> {
    sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
        .bind(user_id)
        .fetch_optional(executor)
        .await
        .map_err(AppError::from)
}

/// Inserts a fresh account on the free tier. The id comes from the
/// identity provider, the customer id from the billing provider.
pub async fn insert<'e, E: Executor<'e, Database = Postgres>>(
    executor: E,
    data: &NewUser,
) -> Res<User> {
    sqlx::query_as::<_, User>(
        r#"
        INSERT INTO users (id, email, name, customer_id, tier_id)
        VALUES ($1, $2, $3, $4, 'free')
        RETURNING *
        "#,
    )
    .bind(data.id)
    .bind(&data.email)
    .bind(&data.name)
    .bind(&data.customer_id)
    .fetch_one(executor)
    .await
    .map_err(AppError::from)
}

pub async fn get_billing_info<'e, E: Executor<'e, Database = Postgres>>(
    executor: E,
    user_id: Uuid,
) -> Res<Option<BillingInfo>> {
    sqlx::query_as::<_, BillingInfo>("SELECT customer_id, currency FROM users WHERE id = $1")
        .bind(user_id)
        .fetch_optional(executor)
        .await
        .map_err(AppError::from)
}

pub async fn get_tier<'e, E: Executor<'e, Database = Postgres>>(
    executor: E,
    user_id: Uuid,
) -> Res<Option<Tier>> {
    sqlx::query_as::<_, Tier>(
        r#"
        SELECT t.* FROM tiers t
        JOIN users u ON u.tier_id = t.id
        WHERE u.id = $1
        "#,
    )
    .bind(user_id)
    .fetch_optional(executor)
    .await
    .map_err(AppError::from)
}

pub async fn get_tier_limit<'e, E: Executor<'e, Database = Postgres>>(
    executor: E,
    user_id: Uuid,
) -> Res<Option<TierLimit>> {
    sqlx::query_as::<_, TierLimit>(
        r#"
        SELECT tl.* FROM tier_limits tl
        JOIN users u ON u.tier_id = tl.id
        WHERE u.id = $1
        "#,
    )
    .bind(user_id)
    .fetch_optional(executor)
    .await
    .map_err(AppError::from)
}

pub async fn delete<'e, E: Executor<'e, Database = Postgres>>(
    executor: E,
    user_id: Uuid,
) -> Res<()> {
    let result = sqlx::query("DELETE FROM users WHERE id = $1")
        .bind(user_id)
        .execute(executor)
        .await
        .map_err(AppError::from)?;

    if result.rows_affected() == 0 {
        return Err(AppError::not_found("User not found", "user"));
    }

    Ok(())
}
