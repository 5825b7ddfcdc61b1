use chrono::{NaiveDate, Utc};
use sqlx::SqliteConnection;
use uuid::Uuid;

use crate::database::models::{RequestStatus, TimeOffRequest};
use crate::error::AppError;

const TIME_OFF_COLUMNS: &str = r#"
    id,
    user_id,
    start_date,
    end_date,
    status,
    reason,
    reviewer_notes,
    approved_by,
    approved_at,
    created_at,
    updated_at
"#;

pub async fn insert(
    conn: &mut SqliteConnection,
    user_id: Uuid,
    start_date: NaiveDate,
    end_date: NaiveDate,
    reason: Option<&str>,
) -> Result<TimeOffRequest, AppError> {
    let now = Utc::now();
    let request = sqlx::query_as::<_, TimeOffRequest>(&format!(
        r#"
        INSERT INTO
            time_off_requests (
                id,
                user_id,
                start_date,
                end_date,
                status,
                reason,
                created_at,
                updated_at
            )
        VALUES
            (?, ?, ?, ?, ?, ?, ?, ?)
        RETURNING {}
        "#,
        TIME_OFF_COLUMNS
    ))
    .bind(Uuid::new_v4())
    .bind(user_id)
    .bind(start_date)
    .bind(end_date)
    .bind(RequestStatus::Pending)
    .bind(reason)
    .bind(now)
    .bind(now)
    .fetch_one(&mut *conn)
    .await?;

    Ok(request)
}

pub async fn find_by_id(
    conn: &mut SqliteConnection,
    id: Uuid,
) -> Result<Option<TimeOffRequest>, AppError> {
    let request = sqlx::query_as::<_, TimeOffRequest>(&format!(
        "SELECT {} FROM time_off_requests WHERE id = ?",
        TIME_OFF_COLUMNS
    ))
    .bind(id)
    .fetch_optional(&mut *conn)
    .await?;

    Ok(request)
}

pub async fn list(
    conn: &mut SqliteConnection,
    status: Option<RequestStatus>,
    user_id: Option<Uuid>,
) -> Result<Vec<TimeOffRequest>, AppError> {
    let requests = sqlx::query_as::<_, TimeOffRequest>(&format!(
        r#"
        SELECT {}
        FROM time_off_requests
        WHERE
            (? IS NULL OR status = ?)
            AND (? IS NULL OR user_id = ?)
        ORDER BY start_date DESC, created_at DESC
        "#,
        TIME_OFF_COLUMNS
    ))
    .bind(status)
    .bind(status)
    .bind(user_id)
    .bind(user_id)
    .fetch_all(&mut *conn)
    .await?;

    Ok(requests)
}

/// Approved leave of the member that includes `date`.
pub async fn approved_covering(
    conn: &mut SqliteConnection,
    user_id: Uuid,
    date: NaiveDate,
) -> Result<Vec<TimeOffRequest>, AppError> {
    let requests = sqlx::query_as::<_, TimeOffRequest>(&format!(
        r#"
        SELECT {}
        FROM time_off_requests
        WHERE
            user_id = ?
            AND status = 'approved'
            AND start_date <= ?
            AND end_date >= ?
        "#,
        TIME_OFF_COLUMNS
    ))
    .bind(user_id)
    .bind(date)
    .bind(date)
    .fetch_all(&mut *conn)
    .await?;

    Ok(requests)
}

/// Record the outcome of a review on a still-pending request.
pub async fn record_review(
    conn: &mut SqliteConnection,
    id: Uuid,
    status: RequestStatus,
    reviewed_by: Uuid,
    reviewer_notes: Option<&str>,
) -> Result<Option<TimeOffRequest>, AppError> {
    let now = Utc::now();
    let request = sqlx::query_as::<_, TimeOffRequest>(&format!(
        r#"
        UPDATE
            time_off_requests
        SET
            status = ?,
            approved_by = ?,
            approved_at = ?,
            reviewer_notes = ?,
            updated_at = ?
        WHERE
            id = ?
            AND status = 'pending'
        RETURNING {}
        "#,
        TIME_OFF_COLUMNS
    ))
    .bind(status)
    .bind(reviewed_by)
    .bind(now)
    .bind(reviewer_notes)
    .bind(now)
    .bind(id)
    .fetch_optional(&mut *conn)
    .await?;

    Ok(request)
}

pub async fn mark_cancelled(
    conn: &mut SqliteConnection,
    id: Uuid,
) -> Result<Option<TimeOffRequest>, AppError> {
    let request = sqlx::query_as::<_, TimeOffRequest>(&format!(
        r#"
        UPDATE time_off_requests
        SET status = ?, updated_at = ?
        WHERE id = ? AND status = 'pending'
        RETURNING {}
        "#,
        TIME_OFF_COLUMNS
    ))
    .bind(RequestStatus::Cancelled)
    .bind(Utc::now())
    .bind(id)
    .fetch_optional(&mut *conn)
    .await?;

    Ok(request)
}
