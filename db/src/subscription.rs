use common::error::{AppError, Res};
use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::{
    dtos::subscription::SubscriptionUpsert,
    models::subscription::{Subscription, SubscriptionSummary},
};

pub async fn get_for_user<'e, E: Executor<'e, Database = Postgres>>(
    executor: E,
    user_id: Uuid,
) -> Res<Option<Subscription>> {
    sqlx::query_as::<_, Subscription>("SELECT * FROM subscriptions WHERE user_id = $1")
        .bind(user_id)
        .fetch_optional(executor)
        .await
        .map_err(AppError::from)
}

pub async fn get_summary_for_user<'e, E: Executor<'e, Database = Postgres>>(
    executor: E,
    user_id: Uuid,
) -> Res<Option<SubscriptionSummary>> {
    sqlx::query_as::<_, SubscriptionSummary>(
        r#"
        SELECT s.id,
               s.tier_id,
               t.name AS tier_name,
               s.price_id,
               p."interval",
               s.status,
               s.current_period_end,
               s.cancel_at_period_end
        FROM subscriptions s
        JOIN tiers t ON t.id = s.tier_id
        JOIN prices p ON p.id = s.price_id
        WHERE s.user_id = $1
        "#,
    )
    .bind(user_id)
    .fetch_optional(executor)
    .await
    .map_err(AppError::from)
}

/// First sync after checkout: moves the user onto the paid tier and
/// records the subscription, both or neither.
pub async fn create_with_tier(pool: &PgPool, data: &SubscriptionUpsert) -> Res<()> {
    let mut tx = pool.begin().await.map_err(AppError::from)?;

    let user_id = update_user_tier(&mut tx, data, false).await?;

    sqlx::query(
        r#"
        INSERT INTO subscriptions
            (id, user_id, tier_id, price_id, item_id, status,
             current_period_start, current_period_end, cancel_at_period_end)
        VALUES ($1, $2, $3, $4, $5, 'active', $6, $7, $8)
        "#,
    )
    .bind(&data.id)
    .bind(user_id)
    .bind(data.tier_id.as_str())
    .bind(&data.price_id)
    .bind(&data.item_id)
    .bind(data.current_period_start)
    .bind(data.current_period_end)
    .bind(data.cancel_at_period_end)
    .execute(&mut *tx)
    .await
    .map_err(AppError::from)?;

    tx.commit().await.map_err(AppError::from)
}

/// Converges the local row onto the provider state. Keyed by user, not by
/// subscription id, because the provider issues a new id when a lapsed
/// customer re-subscribes.
pub async fn update_with_tier(pool: &PgPool, data: &SubscriptionUpsert) -> Res<()> {
    let mut tx = pool.begin().await.map_err(AppError::from)?;

    let user_id = update_user_tier(&mut tx, data, true).await?;

    let result = sqlx::query(
        r#"
        UPDATE subscriptions
        SET id = $2,
            tier_id = $3,
            price_id = $4,
            item_id = $5,
            status = $6,
            current_period_start = $7,
            current_period_end = $8,
            cancel_at_period_end = $9,
            updated_at = now()
        WHERE user_id = $1
        "#,
    )
    .bind(user_id)
    .bind(&data.id)
    .bind(data.tier_id.as_str())
    .bind(&data.price_id)
    .bind(&data.item_id)
    .bind(&data.status)
    .bind(data.current_period_start)
    .bind(data.current_period_end)
    .bind(data.cancel_at_period_end)
    .execute(&mut *tx)
    .await
    .map_err(AppError::from)?;

    if result.rows_affected() == 0 {
        return Err(AppError::not_found(
            "No subscription to update for user",
            "subscription",
        )
        .with_metadata(serde_json::json!({ "customerId": data.customer_id })));
    }

    tx.commit().await.map_err(AppError::from)
}

/// Subscription ended: drop the row and put the user back on the free
/// tier in the same transaction.
pub async fn delete_and_reset_tier(pool: &PgPool, subscription_id: &str) -> Res<()> {
    let mut tx = pool.begin().await.map_err(AppError::from)?;

    let user_id: Option<Uuid> =
        sqlx::query_scalar("DELETE FROM subscriptions WHERE id = $1 RETURNING user_id")
            .bind(subscription_id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(AppError::from)?;

    let Some(user_id) = user_id else {
        return Err(AppError::not_found(
            "No subscription to delete",
            "subscription",
        )
        .with_metadata(serde_json::json!({ "subscriptionId": subscription_id })));
    };

    sqlx::query("UPDATE users SET tier_id = 'free', updated_at = now() WHERE id = $1")
        .bind(user_id)
        .execute(&mut *tx)
        .await
        .map_err(AppError::from)?;

    tx.commit().await.map_err(AppError::from)
}

async fn update_user_tier(
    tx: &mut sqlx::Transaction<'_, Postgres>,
    data: &SubscriptionUpsert,
    with_currency: bool,
) -> Res<Uuid> {
    let user_id: Option<Uuid> = if with_currency {
        sqlx::query_scalar(
            r#"
            UPDATE users SET tier_id = $1, currency = $2, updated_at = now()
            WHERE customer_id = $3
            RETURNING id
            "#,
        )
        .bind(data.tier_id.as_str())
        .bind(data.currency.as_str())
        .bind(&data.customer_id)
        .fetch_optional(&mut **tx)
        .await
        .map_err(AppError::from)?
    } else {
        sqlx::query_scalar(
            r#"
            UPDATE users SET tier_id = $1, updated_at = now()
            WHERE customer_id = $2
            RETURNING id
            "#,
        )
        .bind(data.tier_id.as_str())
        .bind(&data.customer_id)
        .fetch_optional(&mut **tx)
        .await
        .map_err(AppError::from)?
    };

    user_id.ok_or_else(|| {
        AppError::not_found("No user for billing customer", "subscription")
            .with_metadata(serde_json::json!({ "customerId": data.customer_id }))
    })
}
