use actix_web::{HttpResponse, web};
use uuid::Uuid;

use crate::AppState;
use crate::database::models::{RequestQuery, TimeOffRequestInput, TimeOffReviewInput};
use crate::error::AppError;
use crate::handlers::shared::{created, ok};
use crate::services::Actor;

pub async fn list_time_off_requests(
    actor: Actor,
    state: web::Data<AppState>,
    query: web::Query<RequestQuery>,
) -> Result<HttpResponse, AppError> {
    let requests = state.time_off_manager.list(&actor, &query).await?;
    Ok(ok(requests))
}

pub async fn get_time_off_request(
    actor: Actor,
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let request = state
        .time_off_manager
        .get(&actor, path.into_inner())
        .await?;
    Ok(ok(request))
}

pub async fn create_time_off_request(
    actor: Actor,
    state: web::Data<AppState>,
    input: web::Json<TimeOffRequestInput>,
) -> Result<HttpResponse, AppError> {
    let request = state
        .time_off_manager
        .create(&actor, input.into_inner())
        .await?;
    Ok(created(request))
}

pub async fn cancel_time_off_request(
    actor: Actor,
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let request = state
        .time_off_manager
        .cancel(&actor, path.into_inner())
        .await?;
    Ok(ok(request))
}

pub async fn review_time_off_request(
    actor: Actor,
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
    input: web::Json<TimeOffReviewInput>,
) -> Result<HttpResponse, AppError> {
    let request = state
        .time_off_manager
        .review(&actor, path.into_inner(), input.into_inner())
        .await?;
    Ok(ok(request))
}
