use chrono::Utc;
use sqlx::SqliteConnection;
use uuid::Uuid;

use crate::database::models::{ShiftTemplate, ShiftTemplateInput};
use crate::error::AppError;

pub async fn create_template(
    conn: &mut SqliteConnection,
    input: &ShiftTemplateInput,
) -> Result<ShiftTemplate, AppError> {
    let now = Utc::now();
    let template = sqlx::query_as::<_, ShiftTemplate>(
        r#"
        INSERT INTO
            shift_templates (id, name, start_time, end_time, duration_hours, is_active, created_at, updated_at)
        VALUES
            (?, ?, ?, ?, ?, 1, ?, ?)
        RETURNING
            id, name, start_time, end_time, duration_hours, is_active, created_at, updated_at
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(input.name.trim())
    .bind(input.start_time)
    .bind(input.end_time)
    .bind(input.duration_hours())
    .bind(now)
    .bind(now)
    .fetch_one(&mut *conn)
    .await?;

    Ok(template)
}

pub async fn find_by_id(
    conn: &mut SqliteConnection,
    id: Uuid,
) -> Result<Option<ShiftTemplate>, AppError> {
    let template = sqlx::query_as::<_, ShiftTemplate>(
        r#"
        SELECT
            id, name, start_time, end_time, duration_hours, is_active, created_at, updated_at
        FROM
            shift_templates
        WHERE
            id = ?
        "#,
    )
    .bind(id)
    .fetch_optional(&mut *conn)
    .await?;

    Ok(template)
}

pub async fn list_templates(
    conn: &mut SqliteConnection,
    include_inactive: bool,
) -> Result<Vec<ShiftTemplate>, AppError> {
    let templates = sqlx::query_as::<_, ShiftTemplate>(
        r#"
        SELECT
            id, name, start_time, end_time, duration_hours, is_active, created_at, updated_at
        FROM
            shift_templates
        WHERE
            is_active = 1 OR ?
        ORDER BY
            name
        "#,
    )
    .bind(include_inactive)
    .fetch_all(&mut *conn)
    .await?;

    Ok(templates)
}

pub async fn update_template(
    conn: &mut SqliteConnection,
    id: Uuid,
    input: &ShiftTemplateInput,
) -> Result<Option<ShiftTemplate>, AppError> {
    let template = sqlx::query_as::<_, ShiftTemplate>(
        r#"
        UPDATE
            shift_templates
        SET
            name = ?,
            start_time = ?,
            end_time = ?,
            duration_hours = ?,
            updated_at = ?
        WHERE
            id = ?
        RETURNING
            id, name, start_time, end_time, duration_hours, is_active, created_at, updated_at
        "#,
    )
    .bind(input.name.trim())
    .bind(input.start_time)
    .bind(input.end_time)
    .bind(input.duration_hours())
    .bind(Utc::now())
    .bind(id)
    .fetch_optional(&mut *conn)
    .await?;

    Ok(template)
}

pub async fn deactivate_template(
    conn: &mut SqliteConnection,
    id: Uuid,
) -> Result<Option<ShiftTemplate>, AppError> {
    let template = sqlx::query_as::<_, ShiftTemplate>(
        r#"
        UPDATE
            shift_templates
        SET
            is_active = 0,
            updated_at = ?
        WHERE
            id = ?
        RETURNING
            id, name, start_time, end_time, duration_hours, is_active, created_at, updated_at
        "#,
    )
    .bind(Utc::now())
    .bind(id)
    .fetch_optional(&mut *conn)
    .await?;

    Ok(template)
}
