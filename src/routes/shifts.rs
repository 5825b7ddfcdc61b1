use crate::handlers::{assignments, shifts};
use actix_web::web;

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/shifts")
            .route("", web::post().to(shifts::create_shift))
            .route("", web::get().to(shifts::list_shifts))
            .route("/{id}", web::get().to(shifts::get_shift))
            .route(
                "/{shift_id}/assignments",
                web::get().to(assignments::list_for_shift),
            ),
    );
}
