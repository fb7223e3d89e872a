use common::error::{AppError, Res};
use sqlx::{Executor, Postgres};
use uuid::Uuid;

use crate::models::note::Note;

pub async fn list_for_user<'e, E: Executor<'e, Database = Postgres>>(
    executor: E,
    user_id: Uuid,
) -> Res<Vec<Note>> {
    sqlx::query_as::<_, Note>("SELECT * FROM notes WHERE user_id = $1 ORDER BY updated_at DESC")
        .bind(user_id)
        .fetch_all(executor)
        .await
        .map_err(AppError::from)
}

pub async fn count_for_user<'e, E: Executor<'e, Database = Postgres>>(
    executor: E,
    user_id: Uuid,
) -> Res<i64> {
    sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM notes WHERE user_id = $1")
        .bind(user_id)
        .fetch_one(executor)
        .await
        .map_err(AppError::from)
}

pub async fn insert<'e, E: Executor<'e, Database = Postgres>>(
    executor: E,
    user_id: Uuid,
    content: &str,
) -> Res<Note> {
    sqlx::query_as::<_, Note>(
        "INSERT INTO notes (user_id, content) VALUES ($1, $2) RETURNING *",
    )
    .bind(user_id)
    .bind(content)
    .fetch_one(executor)
    .await
    .map_err(AppError::from)
}

/// Updates are scoped to the owner, so a stale or foreign id comes back
/// as `None` rather than touching another user's row.
pub async fn update<'e, E: Executor<'e, Database = Postgres>>(
    executor: E,
    user_id: Uuid,
    note_id: Uuid,
    content: &str,
) -> Res<Option<Note>> {
    sqlx::query_as::<_, Note>(
        r#"
        UPDATE notes SET content = $3, updated_at = now()
        WHERE id = $1 AND user_id = $2
        RETURNING *
        "#,
    )
    .bind(note_id)
    .bind(user_id)
    .bind(content)
    .fetch_optional(executor)
    .await
    .map_err(AppError::from)
}

pub async fn delete<'e, E: Executor<'e, Database = Postgres>>(
    executor: E,
    user_id: Uuid,
    note_id: Uuid,
) -> Res<bool> {
    let result = sqlx::query("DELETE FROM notes WHERE id = $1 AND user_id = $2")
        .bind(note_id)
        .bind(user_id)
        .execute(executor)
        .await
        .map_err(AppError::from)?;

    Ok(result.rows_affected() > 0)
}
