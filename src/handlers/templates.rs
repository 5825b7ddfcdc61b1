use actix_web::{HttpResponse, web};
use serde::Deserialize;
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::AppState;
use crate::database::models::{Action, EntityType, ShiftTemplate, ShiftTemplateInput};
use crate::database::repositories::template;
use crate::database::transaction::{begin, with_retry};
use crate::error::AppError;
use crate::handlers::shared::{created, ok};
use crate::services::{ActivityLogger, Actor};

#[derive(Debug, Deserialize)]
pub struct TemplateQuery {
    #[serde(default)]
    pub include_inactive: bool,
}

pub async fn list_templates(
    _actor: Actor,
    state: web::Data<AppState>,
    query: web::Query<TemplateQuery>,
) -> Result<HttpResponse, AppError> {
    let mut conn = state.pool.acquire().await?;
    let templates = template::list_templates(&mut *conn, query.include_inactive).await?;
    Ok(ok(templates))
}

pub async fn create_template(
    actor: Actor,
    state: web::Data<AppState>,
    input: web::Json<ShiftTemplateInput>,
) -> Result<HttpResponse, AppError> {
    actor.require_manager("create shift templates")?;
    input.validate()?;

    let created_template = with_retry("create template", || {
        insert_template(&state.pool, &actor, &input)
    })
    .await?;

    log::info!("Template {} created", created_template.id);
    Ok(created(created_template))
}

/// Edits reach future generations only; existing shifts keep their times.
pub async fn update_template(
    actor: Actor,
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
    input: web::Json<ShiftTemplateInput>,
) -> Result<HttpResponse, AppError> {
    actor.require_manager("edit shift templates")?;
    input.validate()?;
    let id = path.into_inner();

    let updated = with_retry("update template", || {
        save_template(&state.pool, &actor, id, &input)
    })
    .await?;

    Ok(ok(updated))
}

pub async fn deactivate_template(
    actor: Actor,
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    actor.require_manager("deactivate shift templates")?;
    let id = path.into_inner();

    let deactivated = with_retry("deactivate template", || {
        retire_template(&state.pool, &actor, id)
    })
    .await?;

    log::info!("Template {} deactivated", id);
    Ok(ok(deactivated))
}

async fn insert_template(
    pool: &SqlitePool,
    actor: &Actor,
    input: &ShiftTemplateInput,
) -> Result<ShiftTemplate, AppError> {
    let mut tx = begin(pool).await?;
    let created_template = template::create_template(&mut *tx, input).await?;
    ActivityLogger::log(
        &mut *tx,
        actor.user_id,
        EntityType::TEMPLATE,
        created_template.id,
        Action::CREATED,
        format!("Template '{}' created", created_template.name),
        None,
    )
    .await?;
    tx.commit().await?;
    Ok(created_template)
}

async fn save_template(
    pool: &SqlitePool,
    actor: &Actor,
    id: Uuid,
    input: &ShiftTemplateInput,
) -> Result<ShiftTemplate, AppError> {
    let mut tx = begin(pool).await?;
    let updated = template::update_template(&mut *tx, id, input)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Template {} not found", id)))?;
    ActivityLogger::log(
        &mut *tx,
        actor.user_id,
        EntityType::TEMPLATE,
        id,
        Action::UPDATED,
        format!("Template '{}' updated", updated.name),
        None,
    )
    .await?;
    tx.commit().await?;
    Ok(updated)
}

async fn retire_template(
    pool: &SqlitePool,
    actor: &Actor,
    id: Uuid,
) -> Result<ShiftTemplate, AppError> {
    let mut tx = begin(pool).await?;
    let deactivated = template::deactivate_template(&mut *tx, id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Template {} not found", id)))?;
    ActivityLogger::log(
        &mut *tx,
        actor.user_id,
        EntityType::TEMPLATE,
        id,
        Action::DEACTIVATED,
        format!("Template '{}' deactivated", deactivated.name),
        None,
    )
    .await?;
    tx.commit().await?;
    Ok(deactivated)
}
