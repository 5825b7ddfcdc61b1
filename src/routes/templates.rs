use crate::handlers::templates;
use actix_web::web;

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/templates")
            .route("", web::get().to(templates::list_templates))
            .route("", web::post().to(templates::create_template))
            .route("/{id}", web::put().to(templates::update_template))
            .route("/{id}/deactivate", web::post().to(templates::deactivate_template)),
    );
}
