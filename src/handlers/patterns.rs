use actix_web::{HttpResponse, web};
use serde::Deserialize;
use sqlx::{SqliteConnection, SqlitePool};
use uuid::Uuid;

use crate::AppState;
use crate::database::models::{
    Action, BulkAssignInput, EntityType, GenerateShiftsInput, Pattern, PatternInput,
};
use crate::database::repositories::{pattern, template};
use crate::database::transaction::{begin, with_retry};
use crate::error::AppError;
use crate::handlers::shared::{created, ok, ok_message};
use crate::services::{ActivityLogger, Actor};

#[derive(Debug, Deserialize)]
pub struct PatternQuery {
    #[serde(default)]
    pub include_inactive: bool,
}

pub async fn list_patterns(
    _actor: Actor,
    state: web::Data<AppState>,
    query: web::Query<PatternQuery>,
) -> Result<HttpResponse, AppError> {
    let mut conn = state.pool.acquire().await?;
    let patterns = pattern::list_patterns(&mut *conn, query.include_inactive).await?;
    Ok(ok(patterns))
}

pub async fn get_pattern(
    _actor: Actor,
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();
    let mut conn = state.pool.acquire().await?;
    let found = pattern::find_by_id(&mut *conn, id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Pattern {} not found", id)))?;
    Ok(ok(found))
}

/// A pattern may only link a template that exists and is still active.
async fn check_template(
    conn: &mut SqliteConnection,
    template_id: Option<Uuid>,
) -> Result<(), AppError> {
    let Some(template_id) = template_id else {
        return Ok(());
    };
    let linked = template::find_by_id(conn, template_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Template {} not found", template_id)))?;
    if !linked.is_active {
        return Err(AppError::Validation(format!(
            "Template {} is inactive and cannot be linked",
            template_id
        )));
    }
    Ok(())
}

pub async fn create_pattern(
    actor: Actor,
    state: web::Data<AppState>,
    input: web::Json<PatternInput>,
) -> Result<HttpResponse, AppError> {
    actor.require_manager("create patterns")?;
    input.validate()?;

    let created_pattern = with_retry("create pattern", || {
        insert_pattern(&state.pool, &actor, &input)
    })
    .await?;

    log::info!("Pattern {} created", created_pattern.id);
    Ok(created(created_pattern))
}

pub async fn update_pattern(
    actor: Actor,
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
    input: web::Json<PatternInput>,
) -> Result<HttpResponse, AppError> {
    actor.require_manager("edit patterns")?;
    input.validate()?;
    let id = path.into_inner();

    let updated = with_retry("update pattern", || {
        save_pattern(&state.pool, &actor, id, &input)
    })
    .await?;

    Ok(ok(updated))
}

pub async fn deactivate_pattern(
    actor: Actor,
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    set_pattern_active(&actor, &state, path.into_inner(), false).await
}

pub async fn activate_pattern(
    actor: Actor,
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    set_pattern_active(&actor, &state, path.into_inner(), true).await
}

async fn set_pattern_active(
    actor: &Actor,
    state: &AppState,
    id: Uuid,
    is_active: bool,
) -> Result<HttpResponse, AppError> {
    let (verb, action) = if is_active {
        ("activated", Action::ACTIVATED)
    } else {
        ("deactivated", Action::DEACTIVATED)
    };
    actor.require_manager("change pattern status")?;

    let updated = with_retry("change pattern status", || {
        toggle_pattern(&state.pool, actor, id, is_active, action, verb)
    })
    .await?;

    log::info!("Pattern {} {}", id, verb);
    Ok(ok(updated))
}

/// Patterns that already own shifts are kept; deactivate those instead.
pub async fn delete_pattern(
    actor: Actor,
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    actor.require_manager("delete patterns")?;
    let id = path.into_inner();

    with_retry("delete pattern", || remove_pattern(&state.pool, &actor, id)).await?;

    log::info!("Pattern {} deleted", id);
    Ok(ok_message("Pattern deleted"))
}

async fn insert_pattern(
    pool: &SqlitePool,
    actor: &Actor,
    input: &PatternInput,
) -> Result<Pattern, AppError> {
    let mut tx = begin(pool).await?;
    check_template(&mut *tx, input.template_id).await?;
    let created_pattern = pattern::create_pattern(&mut *tx, input).await?;
    ActivityLogger::log(
        &mut *tx,
        actor.user_id,
        EntityType::PATTERN,
        created_pattern.id,
        Action::CREATED,
        format!(
            "Pattern '{}' ({}) created",
            created_pattern.name, created_pattern.pattern_type
        ),
        None,
    )
    .await?;
    tx.commit().await?;
    Ok(created_pattern)
}

async fn save_pattern(
    pool: &SqlitePool,
    actor: &Actor,
    id: Uuid,
    input: &PatternInput,
) -> Result<Pattern, AppError> {
    let mut tx = begin(pool).await?;
    check_template(&mut *tx, input.template_id).await?;
    let updated = pattern::update_pattern(&mut *tx, id, input)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Pattern {} not found", id)))?;
    ActivityLogger::log(
        &mut *tx,
        actor.user_id,
        EntityType::PATTERN,
        id,
        Action::UPDATED,
        format!("Pattern '{}' updated", updated.name),
        None,
    )
    .await?;
    tx.commit().await?;
    Ok(updated)
}

async fn toggle_pattern(
    pool: &SqlitePool,
    actor: &Actor,
    id: Uuid,
    is_active: bool,
    action: &'static str,
    verb: &str,
) -> Result<Pattern, AppError> {
    let mut tx = begin(pool).await?;
    let updated = pattern::set_active(&mut *tx, id, is_active)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Pattern {} not found", id)))?;
    ActivityLogger::log(
        &mut *tx,
        actor.user_id,
        EntityType::PATTERN,
        id,
        action,
        format!("Pattern '{}' {}", updated.name, verb),
        None,
    )
    .await?;
    tx.commit().await?;
    Ok(updated)
}

async fn remove_pattern(pool: &SqlitePool, actor: &Actor, id: Uuid) -> Result<(), AppError> {
    let mut tx = begin(pool).await?;
    let existing = pattern::find_by_id(&mut *tx, id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Pattern {} not found", id)))?;

    let shift_count = pattern::count_shifts(&mut *tx, id).await?;
    if shift_count > 0 {
        return Err(AppError::conflict(
            format!(
                "Pattern {} owns {} shift(s); deactivate it instead",
                id, shift_count
            ),
            vec![],
        ));
    }

    pattern::delete_pattern(&mut *tx, id).await?;
    ActivityLogger::log(
        &mut *tx,
        actor.user_id,
        EntityType::PATTERN,
        id,
        Action::DELETED,
        format!("Pattern '{}' deleted", existing.name),
        None,
    )
    .await?;
    tx.commit().await?;
    Ok(())
}

pub async fn generate_shifts(
    actor: Actor,
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
    input: web::Json<GenerateShiftsInput>,
) -> Result<HttpResponse, AppError> {
    let result = state
        .shift_generator
        .generate(&actor, path.into_inner(), input.start_date, input.end_date)
        .await?;
    Ok(ok(result))
}

pub async fn bulk_assign(
    actor: Actor,
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
    input: web::Json<BulkAssignInput>,
) -> Result<HttpResponse, AppError> {
    let result = state
        .shift_generator
        .bulk_assign(&actor, path.into_inner(), input.into_inner())
        .await?;
    Ok(ok(result))
}
