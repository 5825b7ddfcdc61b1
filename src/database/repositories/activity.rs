use chrono::Utc;
use sqlx::SqliteConnection;
use uuid::Uuid;

use crate::database::models::{ActivityEntry, CreateActivityInput};
use crate::error::AppError;

/// Append an activity row on the caller's connection, so it commits or rolls
/// back together with the change it describes.
pub async fn log_activity(
    conn: &mut SqliteConnection,
    request: CreateActivityInput,
) -> Result<ActivityEntry, AppError> {
    let metadata_json = request
        .metadata
        .map(|m| serde_json::to_string(&m).unwrap_or_default());

    let entry = sqlx::query_as::<_, ActivityEntry>(
        r#"
        INSERT INTO
            activity_log (
                id,
                entity_type,
                entity_id,
                action,
                actor_id,
                description,
                metadata,
                created_at
            )
        VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        RETURNING
            id,
            entity_type,
            entity_id,
            action,
            actor_id,
            description,
            metadata,
            created_at
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(request.entity_type)
    .bind(request.entity_id)
    .bind(request.action)
    .bind(request.actor_id)
    .bind(request.description)
    .bind(metadata_json)
    .bind(Utc::now())
    .fetch_one(&mut *conn)
    .await?;

    Ok(entry)
}

pub async fn find_by_entity(
    conn: &mut SqliteConnection,
    entity_type: &str,
    entity_id: Uuid,
) -> Result<Vec<ActivityEntry>, AppError> {
    let entries = sqlx::query_as::<_, ActivityEntry>(
        r#"
        SELECT
            id,
            entity_type,
            entity_id,
            action,
            actor_id,
            description,
            metadata,
            created_at
        FROM
            activity_log
        WHERE
            entity_type = ? AND entity_id = ?
        ORDER BY
            created_at
        "#,
    )
    .bind(entity_type)
    .bind(entity_id)
    .fetch_all(&mut *conn)
    .await?;

    Ok(entries)
}
