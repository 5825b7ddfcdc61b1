use crate::handlers::time_off;
use actix_web::web;

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/time-off")
            .route("", web::get().to(time_off::list_time_off_requests))
            .route("", web::post().to(time_off::create_time_off_request))
            .route("/{id}", web::get().to(time_off::get_time_off_request))
            .route("/{id}/cancel", web::post().to(time_off::cancel_time_off_request))
            .route("/{id}/review", web::post().to(time_off::review_time_off_request)),
    );
}
