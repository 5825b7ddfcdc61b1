use actix_web::web;

pub mod assignments;
pub mod patterns;
pub mod shifts;
pub mod swaps;
pub mod templates;
pub mod time_off;

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1")
            .configure(templates::configure)
            .configure(patterns::configure)
            .configure(shifts::configure)
            .configure(assignments::configure)
            .configure(swaps::configure)
            .configure(time_off::configure),
    );
}
