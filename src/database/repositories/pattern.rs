use chrono::Utc;
use sqlx::SqliteConnection;
use uuid::Uuid;

use crate::database::models::{Pattern, PatternInput};
use crate::database::types::{PatternRow, ScheduleColumns, to_json};
use crate::error::AppError;

const PATTERN_COLUMNS: &str = r#"
    id,
    name,
    description,
    pattern_type,
    template_id,
    start_date,
    end_date,
    start_time,
    end_time,
    weekdays,
    days_on,
    days_off,
    rotation_days,
    schedule_config,
    assigned_members,
    is_active,
    created_at,
    updated_at
"#;

pub async fn create_pattern(
    conn: &mut SqliteConnection,
    input: &PatternInput,
) -> Result<Pattern, AppError> {
    let now = Utc::now();
    let columns = ScheduleColumns::from_schedule(&input.schedule)?;

    let row = sqlx::query_as::<_, PatternRow>(&format!(
        r#"
        INSERT INTO
            patterns (
                id,
                name,
                description,
                pattern_type,
                template_id,
                start_date,
                end_date,
                start_time,
                end_time,
                weekdays,
                days_on,
                days_off,
                rotation_days,
                schedule_config,
                assigned_members,
                is_active,
                created_at,
                updated_at
            )
        VALUES
            (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, 1, ?, ?)
        RETURNING {}
        "#,
        PATTERN_COLUMNS
    ))
    .bind(Uuid::new_v4())
    .bind(input.name.trim())
    .bind(&input.description)
    .bind(input.schedule.pattern_type())
    .bind(input.template_id)
    .bind(input.start_date)
    .bind(input.end_date)
    .bind(input.start_time)
    .bind(input.end_time)
    .bind(columns.weekdays)
    .bind(columns.days_on)
    .bind(columns.days_off)
    .bind(columns.rotation_days)
    .bind(columns.schedule_config)
    .bind(to_json(&input.assigned_members)?)
    .bind(now)
    .bind(now)
    .fetch_one(&mut *conn)
    .await?;

    Pattern::try_from(row)
}

pub async fn find_by_id(conn: &mut SqliteConnection, id: Uuid) -> Result<Option<Pattern>, AppError> {
    let row = sqlx::query_as::<_, PatternRow>(&format!(
        "SELECT {} FROM patterns WHERE id = ?",
        PATTERN_COLUMNS
    ))
    .bind(id)
    .fetch_optional(&mut *conn)
    .await?;

    row.map(Pattern::try_from).transpose()
}

pub async fn list_patterns(
    conn: &mut SqliteConnection,
    include_inactive: bool,
) -> Result<Vec<Pattern>, AppError> {
    let rows = sqlx::query_as::<_, PatternRow>(&format!(
        "SELECT {} FROM patterns WHERE is_active = 1 OR ? ORDER BY name",
        PATTERN_COLUMNS
    ))
    .bind(include_inactive)
    .fetch_all(&mut *conn)
    .await?;

    rows.into_iter().map(Pattern::try_from).collect()
}

pub async fn update_pattern(
    conn: &mut SqliteConnection,
    id: Uuid,
    input: &PatternInput,
) -> Result<Option<Pattern>, AppError> {
    let columns = ScheduleColumns::from_schedule(&input.schedule)?;

    let row = sqlx::query_as::<_, PatternRow>(&format!(
        r#"
        UPDATE
            patterns
        SET
            name = ?,
            description = ?,
            pattern_type = ?,
            template_id = ?,
            start_date = ?,
            end_date = ?,
            start_time = ?,
            end_time = ?,
            weekdays = ?,
            days_on = ?,
            days_off = ?,
            rotation_days = ?,
            schedule_config = ?,
            assigned_members = ?,
            updated_at = ?
        WHERE
            id = ?
        RETURNING {}
        "#,
        PATTERN_COLUMNS
    ))
    .bind(input.name.trim())
    .bind(&input.description)
    .bind(input.schedule.pattern_type())
    .bind(input.template_id)
    .bind(input.start_date)
    .bind(input.end_date)
    .bind(input.start_time)
    .bind(input.end_time)
    .bind(columns.weekdays)
    .bind(columns.days_on)
    .bind(columns.days_off)
    .bind(columns.rotation_days)
    .bind(columns.schedule_config)
    .bind(to_json(&input.assigned_members)?)
    .bind(Utc::now())
    .bind(id)
    .fetch_optional(&mut *conn)
    .await?;

    row.map(Pattern::try_from).transpose()
}

pub async fn set_active(
    conn: &mut SqliteConnection,
    id: Uuid,
    is_active: bool,
) -> Result<Option<Pattern>, AppError> {
    let row = sqlx::query_as::<_, PatternRow>(&format!(
        "UPDATE patterns SET is_active = ?, updated_at = ? WHERE id = ? RETURNING {}",
        PATTERN_COLUMNS
    ))
    .bind(is_active)
    .bind(Utc::now())
    .bind(id)
    .fetch_optional(&mut *conn)
    .await?;

    row.map(Pattern::try_from).transpose()
}

pub async fn delete_pattern(conn: &mut SqliteConnection, id: Uuid) -> Result<bool, AppError> {
    let result = sqlx::query("DELETE FROM patterns WHERE id = ?")
        .bind(id)
        .execute(&mut *conn)
        .await?;

    Ok(result.rows_affected() > 0)
}

pub async fn count_shifts(conn: &mut SqliteConnection, id: Uuid) -> Result<i64, AppError> {
    let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM shifts WHERE pattern_id = ?")
        .bind(id)
        .fetch_one(&mut *conn)
        .await?;

    Ok(count)
}
