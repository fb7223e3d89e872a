use common::error::{AppError, Res};
use sqlx::{Executor, Postgres};

use crate::models::price::{Price, PricingRow};

pub async fn get<'e, E: Executor<'e, Database = Postgres>>(
    executor: E,
    price_id: &str,
) -> Res<Option<Price>> {
    sqlx::query_as::<_, Price>(r#"SELECT id, tier_id, "interval" FROM prices WHERE id = $1"#)
        .bind(price_id)
        .fetch_optional(executor)
        .await
        .map_err(AppError::from)
}

/// Everything the pricing page needs for one currency: active tiers with
/// their limits and per-interval amounts, cheapest first.
pub async fn pricing_rows<'e, E: Executor<'e, Database = Postgres>>(
    executor: E,
    currency: &str,
) -> Res<Vec<PricingRow>> {
    sqlx::query_as::<_, PricingRow>(
        r#"
        SELECT t.id AS tier_id,
               t.name AS tier_name,
               t.description AS tier_description,
               t.features_list,
               tl.max_number_of_notes,
               p.id AS price_id,
               p."interval",
               pc.currency,
               pc.amount
        FROM tiers t
        JOIN tier_limits tl ON tl.id = t.id
        JOIN prices p ON p.tier_id = t.id
        JOIN price_currencies pc ON pc.price_id = p.id
        WHERE pc.currency = $1 AND t.active = TRUE
        ORDER BY pc.amount ASC, p."interval" ASC
        "#,
    )
    .bind(currency)
    .fetch_all(executor)
    .await
    .map_err(AppError::from)
}
