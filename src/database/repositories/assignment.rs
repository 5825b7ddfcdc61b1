use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use sqlx::SqliteConnection;
use uuid::Uuid;

use crate::database::models::{Assignment, AssignmentStatus, Position};
use crate::error::AppError;

const ASSIGNMENT_COLUMNS: &str = r#"
    id,
    shift_id,
    user_id,
    position,
    status,
    assigned_by,
    confirmed_at,
    notes,
    created_at,
    updated_at
"#;

/// An active assignment joined with the times of its shift.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct AssignedShift {
    pub assignment_id: Uuid,
    pub shift_id: Uuid,
    pub shift_date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
}

pub struct NewAssignment<'a> {
    pub shift_id: Uuid,
    pub user_id: Uuid,
    pub position: Position,
    pub assigned_by: Uuid,
    pub notes: Option<&'a str>,
}

pub async fn insert(
    conn: &mut SqliteConnection,
    new: NewAssignment<'_>,
) -> Result<Assignment, AppError> {
    let now = Utc::now();
    let assignment = sqlx::query_as::<_, Assignment>(&format!(
        r#"
        INSERT INTO
            assignments (
                id,
                shift_id,
                user_id,
                position,
                status,
                assigned_by,
                confirmed_at,
                notes,
                created_at,
                updated_at
            )
        VALUES
            (?, ?, ?, ?, ?, ?, NULL, ?, ?, ?)
        RETURNING {}
        "#,
        ASSIGNMENT_COLUMNS
    ))
    .bind(Uuid::new_v4())
    .bind(new.shift_id)
    .bind(new.user_id)
    .bind(new.position)
    .bind(AssignmentStatus::Assigned)
    .bind(new.assigned_by)
    .bind(new.notes)
    .bind(now)
    .bind(now)
    .fetch_one(&mut *conn)
    .await?;

    Ok(assignment)
}

pub async fn find_by_id(
    conn: &mut SqliteConnection,
    id: Uuid,
) -> Result<Option<Assignment>, AppError> {
    let assignment = sqlx::query_as::<_, Assignment>(&format!(
        "SELECT {} FROM assignments WHERE id = ?",
        ASSIGNMENT_COLUMNS
    ))
    .bind(id)
    .fetch_optional(&mut *conn)
    .await?;

    Ok(assignment)
}

pub async fn list_by_shift(
    conn: &mut SqliteConnection,
    shift_id: Uuid,
) -> Result<Vec<Assignment>, AppError> {
    let assignments = sqlx::query_as::<_, Assignment>(&format!(
        "SELECT {} FROM assignments WHERE shift_id = ? ORDER BY created_at",
        ASSIGNMENT_COLUMNS
    ))
    .bind(shift_id)
    .fetch_all(&mut *conn)
    .await?;

    Ok(assignments)
}

pub async fn list_by_user(
    conn: &mut SqliteConnection,
    user_id: Uuid,
) -> Result<Vec<Assignment>, AppError> {
    let assignments = sqlx::query_as::<_, Assignment>(
        r#"
        SELECT
            a.id,
            a.shift_id,
            a.user_id,
            a.position,
            a.status,
            a.assigned_by,
            a.confirmed_at,
            a.notes,
            a.created_at,
            a.updated_at
        FROM
            assignments a
            JOIN shifts s ON s.id = a.shift_id
        WHERE
            a.user_id = ?
        ORDER BY
            s.shift_date,
            s.start_time
        "#,
    )
    .bind(user_id)
    .fetch_all(&mut *conn)
    .await?;

    Ok(assignments)
}

/// Active assignments of a member on shifts dated within `[from, to]`.
pub async fn active_for_user_between(
    conn: &mut SqliteConnection,
    user_id: Uuid,
    from: NaiveDate,
    to: NaiveDate,
) -> Result<Vec<AssignedShift>, AppError> {
    let rows = sqlx::query_as::<_, AssignedShift>(
        r#"
        SELECT
            a.id AS assignment_id,
            s.id AS shift_id,
            s.shift_date,
            s.start_time,
            s.end_time
        FROM
            assignments a
            JOIN shifts s ON s.id = a.shift_id
        WHERE
            a.user_id = ?
            AND a.status IN ('assigned', 'confirmed')
            AND s.shift_date >= ?
            AND s.shift_date <= ?
        ORDER BY
            s.shift_date,
            s.start_time
        "#,
    )
    .bind(user_id)
    .bind(from)
    .bind(to)
    .fetch_all(&mut *conn)
    .await?;

    Ok(rows)
}

/// Users holding an active assignment on the shift.
pub async fn active_holders(
    conn: &mut SqliteConnection,
    shift_id: Uuid,
) -> Result<Vec<Assignment>, AppError> {
    let assignments = sqlx::query_as::<_, Assignment>(&format!(
        r#"
        SELECT {}
        FROM assignments
        WHERE shift_id = ? AND status IN ('assigned', 'confirmed')
        ORDER BY created_at
        "#,
        ASSIGNMENT_COLUMNS
    ))
    .bind(shift_id)
    .fetch_all(&mut *conn)
    .await?;

    Ok(assignments)
}

pub async fn find_active(
    conn: &mut SqliteConnection,
    user_id: Uuid,
    shift_id: Uuid,
) -> Result<Option<Assignment>, AppError> {
    let assignment = sqlx::query_as::<_, Assignment>(&format!(
        r#"
        SELECT {}
        FROM assignments
        WHERE user_id = ? AND shift_id = ? AND status IN ('assigned', 'confirmed')
        "#,
        ASSIGNMENT_COLUMNS
    ))
    .bind(user_id)
    .bind(shift_id)
    .fetch_optional(&mut *conn)
    .await?;

    Ok(assignment)
}

/// Write a new status. `confirmed_at` is stamped when moving to confirmed and
/// left untouched otherwise. A non-`None` note replaces the stored one.
pub async fn set_status(
    conn: &mut SqliteConnection,
    id: Uuid,
    status: AssignmentStatus,
    notes: Option<&str>,
) -> Result<Assignment, AppError> {
    let now = Utc::now();
    let confirmed_at: Option<DateTime<Utc>> =
        (status == AssignmentStatus::Confirmed).then_some(now);

    let assignment = sqlx::query_as::<_, Assignment>(&format!(
        r#"
        UPDATE
            assignments
        SET
            status = ?,
            confirmed_at = COALESCE(?, confirmed_at),
            notes = COALESCE(?, notes),
            updated_at = ?
        WHERE
            id = ?
        RETURNING {}
        "#,
        ASSIGNMENT_COLUMNS
    ))
    .bind(status)
    .bind(confirmed_at)
    .bind(notes)
    .bind(now)
    .bind(id)
    .fetch_optional(&mut *conn)
    .await?;

    assignment.ok_or_else(|| AppError::NotFound(format!("Assignment {} not found", id)))
}

pub async fn update_details(
    conn: &mut SqliteConnection,
    id: Uuid,
    position: Option<Position>,
    notes: Option<&str>,
) -> Result<Assignment, AppError> {
    let assignment = sqlx::query_as::<_, Assignment>(&format!(
        r#"
        UPDATE
            assignments
        SET
            position = COALESCE(?, position),
            notes = COALESCE(?, notes),
            updated_at = ?
        WHERE
            id = ?
        RETURNING {}
        "#,
        ASSIGNMENT_COLUMNS
    ))
    .bind(position)
    .bind(notes)
    .bind(Utc::now())
    .bind(id)
    .fetch_optional(&mut *conn)
    .await?;

    assignment.ok_or_else(|| AppError::NotFound(format!("Assignment {} not found", id)))
}

/// Hand an assignment to another member. It goes back to `assigned` with
/// `confirmed_at` cleared, since the new holder has not confirmed anything.
pub async fn reassign(
    conn: &mut SqliteConnection,
    id: Uuid,
    user_id: Uuid,
) -> Result<Assignment, AppError> {
    let assignment = sqlx::query_as::<_, Assignment>(&format!(
        r#"
        UPDATE
            assignments
        SET
            user_id = ?,
            status = ?,
            confirmed_at = NULL,
            updated_at = ?
        WHERE
            id = ?
        RETURNING {}
        "#,
        ASSIGNMENT_COLUMNS
    ))
    .bind(user_id)
    .bind(AssignmentStatus::Assigned)
    .bind(Utc::now())
    .bind(id)
    .fetch_optional(&mut *conn)
    .await?;

    assignment.ok_or_else(|| AppError::NotFound(format!("Assignment {} not found", id)))
}

/// Point an assignment at a different shift, keeping holder and status.
pub async fn move_to_shift(
    conn: &mut SqliteConnection,
    id: Uuid,
    shift_id: Uuid,
) -> Result<Assignment, AppError> {
    let assignment = sqlx::query_as::<_, Assignment>(&format!(
        "UPDATE assignments SET shift_id = ?, updated_at = ? WHERE id = ? RETURNING {}",
        ASSIGNMENT_COLUMNS
    ))
    .bind(shift_id)
    .bind(Utc::now())
    .bind(id)
    .fetch_optional(&mut *conn)
    .await?;

    assignment.ok_or_else(|| AppError::NotFound(format!("Assignment {} not found", id)))
}

pub async fn delete(conn: &mut SqliteConnection, id: Uuid) -> Result<bool, AppError> {
    let result = sqlx::query("DELETE FROM assignments WHERE id = ?")
        .bind(id)
        .execute(&mut *conn)
        .await?;

    Ok(result.rows_affected() > 0)
}
