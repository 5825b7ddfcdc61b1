use actix_web::{HttpResponse, web};
use chrono::{Duration, NaiveDate};
use chrono_tz::Tz;
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::AppState;
use crate::database::models::{Action, EntityType, Shift, ShiftDetail, ShiftInput, ShiftQuery};
use crate::database::repositories::shift;
use crate::database::transaction::{begin, with_retry};
use crate::error::AppError;
use crate::handlers::shared::{created, ok};
use crate::services::time_window::{LocalSlot, TimeWindow, today_in};
use crate::services::{ActivityLogger, Actor};

/// Days listed when the query names no end date.
const DEFAULT_LISTING_DAYS: i64 = 30;

fn shift_detail(tz: Tz, shift: Shift) -> Result<ShiftDetail, AppError> {
    let window = TimeWindow::resolve(tz, LocalSlot::from(&shift))?;
    Ok(ShiftDetail {
        shift,
        starts_at: window.starts_at,
        ends_at: window.ends_at,
        duration_hours: window.duration_hours(),
    })
}

/// Manual shift outside any pattern, e.g. a standby for an event.
pub async fn create_shift(
    actor: Actor,
    state: web::Data<AppState>,
    input: web::Json<ShiftInput>,
) -> Result<HttpResponse, AppError> {
    actor.require_manager("create shifts")?;

    let new_shift = with_retry("create shift", || {
        insert_manual_shift(&state.pool, &actor, &input)
    })
    .await?;

    Ok(created(shift_detail(actor.timezone, new_shift)?))
}

async fn insert_manual_shift(
    pool: &SqlitePool,
    actor: &Actor,
    input: &ShiftInput,
) -> Result<Shift, AppError> {
    let mut tx = begin(pool).await?;
    let new_shift = shift::create_manual(&mut *tx, input).await?;
    ActivityLogger::log(
        &mut *tx,
        actor.user_id,
        EntityType::SHIFT,
        new_shift.id,
        Action::CREATED,
        format!("Manual shift created on {}", new_shift.shift_date),
        None,
    )
    .await?;
    tx.commit().await?;
    Ok(new_shift)
}

pub async fn get_shift(
    actor: Actor,
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();
    let mut conn = state.pool.acquire().await?;
    let found = shift::find_by_id(&mut *conn, id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Shift {} not found", id)))?;

    Ok(ok(shift_detail(actor.timezone, found)?))
}

/// Last date listed; defaults to a fixed window after `from`.
fn listing_end(from: NaiveDate, to: Option<NaiveDate>) -> Result<NaiveDate, AppError> {
    let to = match to {
        Some(to) => to,
        None => from
            .checked_add_signed(Duration::days(DEFAULT_LISTING_DAYS - 1))
            .ok_or_else(|| AppError::Validation(format!("'from' {} is out of range", from)))?,
    };
    if to < from {
        return Err(AppError::Validation(
            "'to' must not be before 'from'".to_string(),
        ));
    }
    Ok(to)
}

pub async fn list_shifts(
    actor: Actor,
    state: web::Data<AppState>,
    query: web::Query<ShiftQuery>,
) -> Result<HttpResponse, AppError> {
    let from = query.from.unwrap_or_else(|| today_in(actor.timezone));
    let to = listing_end(from, query.to)?;

    let mut conn = state.pool.acquire().await?;
    let shifts = shift::list_by_pattern(&mut *conn, query.pattern_id, from, to).await?;
    let details = shifts
        .into_iter()
        .map(|s| shift_detail(actor.timezone, s))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(ok(details))
}
