use chrono::Utc;
use sqlx::SqliteConnection;
use uuid::Uuid;

use crate::database::models::{RequestStatus, SwapRequest};
use crate::error::AppError;

const SWAP_COLUMNS: &str = r#"
    id,
    requesting_user_id,
    offering_shift_id,
    requesting_shift_id,
    target_user_id,
    status,
    reason,
    reviewed_by,
    reviewer_notes,
    reviewed_at,
    created_at,
    updated_at
"#;

pub struct NewSwapRequest<'a> {
    pub requesting_user_id: Uuid,
    pub offering_shift_id: Uuid,
    pub requesting_shift_id: Option<Uuid>,
    pub target_user_id: Option<Uuid>,
    pub reason: Option<&'a str>,
}

pub async fn insert(
    conn: &mut SqliteConnection,
    new: NewSwapRequest<'_>,
) -> Result<SwapRequest, AppError> {
    let now = Utc::now();
    let request = sqlx::query_as::<_, SwapRequest>(&format!(
        r#"
        INSERT INTO
            swap_requests (
                id,
                requesting_user_id,
                offering_shift_id,
                requesting_shift_id,
                target_user_id,
                status,
                reason,
                created_at,
                updated_at
            )
        VALUES
            (?, ?, ?, ?, ?, ?, ?, ?, ?)
        RETURNING {}
        "#,
        SWAP_COLUMNS
    ))
    .bind(Uuid::new_v4())
    .bind(new.requesting_user_id)
    .bind(new.offering_shift_id)
    .bind(new.requesting_shift_id)
    .bind(new.target_user_id)
    .bind(RequestStatus::Pending)
    .bind(new.reason)
    .bind(now)
    .bind(now)
    .fetch_one(&mut *conn)
    .await?;

    Ok(request)
}

pub async fn find_by_id(
    conn: &mut SqliteConnection,
    id: Uuid,
) -> Result<Option<SwapRequest>, AppError> {
    let request = sqlx::query_as::<_, SwapRequest>(&format!(
        "SELECT {} FROM swap_requests WHERE id = ?",
        SWAP_COLUMNS
    ))
    .bind(id)
    .fetch_optional(&mut *conn)
    .await?;

    Ok(request)
}

/// Newest first. `party` limits the result to requests the user made or is
/// the target of.
pub async fn list(
    conn: &mut SqliteConnection,
    status: Option<RequestStatus>,
    party: Option<Uuid>,
) -> Result<Vec<SwapRequest>, AppError> {
    let requests = sqlx::query_as::<_, SwapRequest>(&format!(
        r#"
        SELECT {}
        FROM swap_requests
        WHERE
            (? IS NULL OR status = ?)
            AND (? IS NULL OR requesting_user_id = ? OR target_user_id = ?)
        ORDER BY created_at DESC
        "#,
        SWAP_COLUMNS
    ))
    .bind(status)
    .bind(status)
    .bind(party)
    .bind(party)
    .bind(party)
    .fetch_all(&mut *conn)
    .await?;

    Ok(requests)
}

/// Record the outcome of a review. Only a pending row is touched, so a
/// request decided by a concurrent reviewer comes back as `None`.
pub async fn record_review(
    conn: &mut SqliteConnection,
    id: Uuid,
    status: RequestStatus,
    reviewed_by: Uuid,
    reviewer_notes: Option<&str>,
    target_user_id: Option<Uuid>,
) -> Result<Option<SwapRequest>, AppError> {
    let now = Utc::now();
    let request = sqlx::query_as::<_, SwapRequest>(&format!(
        r#"
        UPDATE
            swap_requests
        SET
            status = ?,
            reviewed_by = ?,
            reviewer_notes = ?,
            reviewed_at = ?,
            target_user_id = COALESCE(target_user_id, ?),
            updated_at = ?
        WHERE
            id = ?
            AND status = 'pending'
        RETURNING {}
        "#,
        SWAP_COLUMNS
    ))
    .bind(status)
    .bind(reviewed_by)
    .bind(reviewer_notes)
    .bind(now)
    .bind(target_user_id)
    .bind(now)
    .bind(id)
    .fetch_optional(&mut *conn)
    .await?;

    Ok(request)
}

pub async fn mark_cancelled(
    conn: &mut SqliteConnection,
    id: Uuid,
) -> Result<Option<SwapRequest>, AppError> {
    let request = sqlx::query_as::<_, SwapRequest>(&format!(
        r#"
        UPDATE swap_requests
        SET status = ?, updated_at = ?
        WHERE id = ? AND status = 'pending'
        RETURNING {}
        "#,
        SWAP_COLUMNS
    ))
    .bind(RequestStatus::Cancelled)
    .bind(Utc::now())
    .bind(id)
    .fetch_optional(&mut *conn)
    .await?;

    Ok(request)
}
