use crate::handlers::patterns;
use actix_web::web;

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/patterns")
            .route("", web::get().to(patterns::list_patterns))
            .route("", web::post().to(patterns::create_pattern))
            .route("/{id}", web::get().to(patterns::get_pattern))
            .route("/{id}", web::put().to(patterns::update_pattern))
            .route("/{id}", web::delete().to(patterns::delete_pattern))
            .route("/{id}/activate", web::post().to(patterns::activate_pattern))
            .route("/{id}/deactivate", web::post().to(patterns::deactivate_pattern))
            .route("/{id}/generate", web::post().to(patterns::generate_shifts))
            .route("/{id}/bulk-assign", web::post().to(patterns::bulk_assign)),
    );
}
