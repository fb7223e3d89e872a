use common::error::{AppError, Res};
use sqlx::{Executor, Postgres};

use crate::{dtos::tier::TierUpdate, models::tier::Tier};

pub async fn get<'e, E: Executor<'e, Database = Postgres>>(
    executor: E,
    tier_id: &str,
) -> Res<Option<Tier>> {
    sqlx::query_as::<_, Tier>("SELECT * FROM tiers WHERE id = $1")
        .bind(tier_id)
        .fetch_optional(executor)
        .await
        .map_err(AppError::from)
}

/// Applies a provider product change to the matching tier. Only display
/// metadata moves; limits and prices are managed locally.
pub async fn update_metadata<'e, E: Executor<'e, Database = Postgres>>(
    executor: E,
    data: &TierUpdate,
) -> Res<()> {
    let result = sqlx::query("UPDATE tiers SET name = $2, description = $3, active = $4 WHERE id = $1")
        .bind(data.id.as_str())
        .bind(&data.name)
        .bind(&data.description)
        .bind(data.active)
        .execute(executor)
        .await
        .map_err(AppError::from)?;

    if result.rows_affected() == 0 {
        return Err(AppError::not_found(
            format!("Tier {} not found", data.id),
            "tier",
        ));
    }

    Ok(())
}
