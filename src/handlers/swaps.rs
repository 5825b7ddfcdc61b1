use actix_web::{HttpResponse, web};
use uuid::Uuid;

use crate::AppState;
use crate::database::models::{RequestQuery, SwapRequestInput, SwapReviewInput};
use crate::error::AppError;
use crate::handlers::shared::{created, ok};
use crate::services::Actor;

pub async fn list_swap_requests(
    actor: Actor,
    state: web::Data<AppState>,
    query: web::Query<RequestQuery>,
) -> Result<HttpResponse, AppError> {
    let requests = state.swap_negotiator.list(&actor, &query).await?;
    Ok(ok(requests))
}

pub async fn get_swap_request(
    actor: Actor,
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let request = state.swap_negotiator.get(&actor, path.into_inner()).await?;
    Ok(ok(request))
}

pub async fn create_swap_request(
    actor: Actor,
    state: web::Data<AppState>,
    input: web::Json<SwapRequestInput>,
) -> Result<HttpResponse, AppError> {
    let request = state
        .swap_negotiator
        .create(&actor, input.into_inner())
        .await?;
    Ok(created(request))
}

pub async fn cancel_swap_request(
    actor: Actor,
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let request = state
        .swap_negotiator
        .cancel(&actor, path.into_inner())
        .await?;
    Ok(ok(request))
}

pub async fn review_swap_request(
    actor: Actor,
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
    input: web::Json<SwapReviewInput>,
) -> Result<HttpResponse, AppError> {
    let request = state
        .swap_negotiator
        .review(&actor, path.into_inner(), input.into_inner())
        .await?;
    Ok(ok(request))
}
