use actix_web::{HttpResponse, web};
use serde::Deserialize;
use uuid::Uuid;

use crate::AppState;
use crate::database::models::{AssignmentInput, AssignmentUpdateInput};
use crate::error::AppError;
use crate::handlers::shared::{created, ok, ok_message};
use crate::services::Actor;

#[derive(Debug, Deserialize)]
pub struct AssignmentQuery {
    pub user_id: Option<Uuid>,
}

#[derive(Debug, Deserialize)]
pub struct RemoveQuery {
    #[serde(default, rename = "override")]
    pub override_confirmed: bool,
}

pub async fn list_for_shift(
    actor: Actor,
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let details = state
        .assignment_manager
        .list(&actor, path.into_inner())
        .await?;
    Ok(ok(details))
}

/// The caller's own schedule, or a member's when a manager passes `user_id`.
pub async fn list_for_user(
    actor: Actor,
    state: web::Data<AppState>,
    query: web::Query<AssignmentQuery>,
) -> Result<HttpResponse, AppError> {
    let user_id = query.user_id.unwrap_or(actor.user_id);
    let assignments = state
        .assignment_manager
        .list_for_user(&actor, user_id)
        .await?;
    Ok(ok(assignments))
}

pub async fn get_assignment(
    actor: Actor,
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let found = state.assignment_manager.get(path.into_inner()).await?;
    actor.require_self_or_manager(found.user_id, "view assignments")?;
    Ok(ok(found))
}

pub async fn create_assignment(
    actor: Actor,
    state: web::Data<AppState>,
    input: web::Json<AssignmentInput>,
) -> Result<HttpResponse, AppError> {
    let assignment = state
        .assignment_manager
        .create(&actor, input.into_inner())
        .await?;
    Ok(created(assignment))
}

pub async fn update_assignment(
    actor: Actor,
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
    input: web::Json<AssignmentUpdateInput>,
) -> Result<HttpResponse, AppError> {
    let assignment = state
        .assignment_manager
        .update(&actor, path.into_inner(), input.into_inner())
        .await?;
    Ok(ok(assignment))
}

pub async fn confirm_assignment(
    actor: Actor,
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let assignment = state
        .assignment_manager
        .confirm(&actor, path.into_inner())
        .await?;
    Ok(ok(assignment))
}

pub async fn decline_assignment(
    actor: Actor,
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let assignment = state
        .assignment_manager
        .decline(&actor, path.into_inner())
        .await?;
    Ok(ok(assignment))
}

pub async fn cancel_assignment(
    actor: Actor,
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let assignment = state
        .assignment_manager
        .cancel(&actor, path.into_inner())
        .await?;
    Ok(ok(assignment))
}

pub async fn mark_no_show(
    actor: Actor,
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let assignment = state
        .assignment_manager
        .mark_no_show(&actor, path.into_inner())
        .await?;
    Ok(ok(assignment))
}

pub async fn remove_assignment(
    actor: Actor,
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
    query: web::Query<RemoveQuery>,
) -> Result<HttpResponse, AppError> {
    state
        .assignment_manager
        .remove(&actor, path.into_inner(), query.override_confirmed)
        .await?;
    Ok(ok_message("Assignment removed"))
}
