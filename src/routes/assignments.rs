use crate::handlers::assignments;
use actix_web::web;

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/assignments")
            .route("", web::get().to(assignments::list_for_user))
            .route("", web::post().to(assignments::create_assignment))
            .route("/{id}", web::get().to(assignments::get_assignment))
            .route("/{id}", web::put().to(assignments::update_assignment))
            .route("/{id}", web::delete().to(assignments::remove_assignment))
            .route("/{id}/confirm", web::post().to(assignments::confirm_assignment))
            .route("/{id}/decline", web::post().to(assignments::decline_assignment))
            .route("/{id}/cancel", web::post().to(assignments::cancel_assignment))
            .route("/{id}/no-show", web::post().to(assignments::mark_no_show)),
    );
}
