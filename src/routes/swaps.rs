use crate::handlers::swaps;
use actix_web::web;

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/swaps")
            .route("", web::get().to(swaps::list_swap_requests))
            .route("", web::post().to(swaps::create_swap_request))
            .route("/{id}", web::get().to(swaps::get_swap_request))
            .route("/{id}/cancel", web::post().to(swaps::cancel_swap_request))
            .route("/{id}/review", web::post().to(swaps::review_swap_request)),
    );
}
