use chrono::{NaiveDate, NaiveTime, Utc};
use sqlx::SqliteConnection;
use uuid::Uuid;

use crate::database::models::{Shift, ShiftInput};
use crate::error::AppError;

/// Insert one pattern-derived shift. Returns `false` when the pattern already
/// owns a shift on that date, including when a concurrent generator won the
/// insert between our check and our write.
pub async fn insert_generated(
    conn: &mut SqliteConnection,
    pattern_id: Uuid,
    shift_date: NaiveDate,
    start_time: NaiveTime,
    end_time: NaiveTime,
) -> Result<bool, AppError> {
    let now = Utc::now();
    let result = sqlx::query(
        r#"
        INSERT INTO
            shifts (id, pattern_id, shift_date, start_time, end_time, notes, created_at, updated_at)
        VALUES
            (?, ?, ?, ?, ?, NULL, ?, ?)
        ON CONFLICT (pattern_id, shift_date) DO NOTHING
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(pattern_id)
    .bind(shift_date)
    .bind(start_time)
    .bind(end_time)
    .bind(now)
    .bind(now)
    .execute(&mut *conn)
    .await;

    match result {
        Ok(done) => Ok(done.rows_affected() > 0),
        Err(sqlx::Error::Database(db_error)) if db_error.is_unique_violation() => Ok(false),
        Err(error) => Err(error.into()),
    }
}

pub async fn create_manual(
    conn: &mut SqliteConnection,
    input: &ShiftInput,
) -> Result<Shift, AppError> {
    let now = Utc::now();
    let shift = sqlx::query_as::<_, Shift>(
        r#"
        INSERT INTO
            shifts (id, pattern_id, shift_date, start_time, end_time, notes, created_at, updated_at)
        VALUES
            (?, NULL, ?, ?, ?, ?, ?, ?)
        RETURNING
            id, pattern_id, shift_date, start_time, end_time, notes, created_at, updated_at
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(input.shift_date)
    .bind(input.start_time)
    .bind(input.end_time)
    .bind(&input.notes)
    .bind(now)
    .bind(now)
    .fetch_one(&mut *conn)
    .await?;

    Ok(shift)
}

pub async fn find_by_id(conn: &mut SqliteConnection, id: Uuid) -> Result<Option<Shift>, AppError> {
    let shift = sqlx::query_as::<_, Shift>(
        r#"
        SELECT
            id, pattern_id, shift_date, start_time, end_time, notes, created_at, updated_at
        FROM
            shifts
        WHERE
            id = ?
        "#,
    )
    .bind(id)
    .fetch_optional(&mut *conn)
    .await?;

    Ok(shift)
}

/// Shifts of one pattern with `from <= shift_date <= to`, in date order.
pub async fn list_by_pattern(
    conn: &mut SqliteConnection,
    pattern_id: Uuid,
    from: NaiveDate,
    to: NaiveDate,
) -> Result<Vec<Shift>, AppError> {
    let shifts = sqlx::query_as::<_, Shift>(
        r#"
        SELECT
            id, pattern_id, shift_date, start_time, end_time, notes, created_at, updated_at
        FROM
            shifts
        WHERE
            pattern_id = ?
            AND shift_date >= ?
            AND shift_date <= ?
        ORDER BY
            shift_date
        "#,
    )
    .bind(pattern_id)
    .bind(from)
    .bind(to)
    .fetch_all(&mut *conn)
    .await?;

    Ok(shifts)
}
