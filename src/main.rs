use actix_cors::Cors;
use actix_web::{App, HttpResponse, HttpServer, Responder, get, middleware::Logger, web};
use anyhow::Result;

use scheduling::database::init_database;
use scheduling::middleware::RequestIdMiddleware;
use scheduling::{AppState, Config, routes};

#[get("/")]
async fn hello() -> impl Responder {
    HttpResponse::Ok().body("Scheduling API v1.0")
}

#[get("/health")]
async fn health() -> impl Responder {
    HttpResponse::Ok().json(serde_json::json!({
        "status": "ok",
        "timestamp": chrono::Utc::now()
    }))
}

#[actix_web::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = Config::from_env()?;

    log::info!(
        "Starting scheduling API (environment: {}, timezone: {}, time-off policy: {})",
        config.environment,
        config.organization_timezone.name(),
        config.time_off_approval_policy
    );

    let pool = init_database(&config).await?;
    log::info!("Database initialized");

    let app_state = web::Data::new(AppState::new(pool, &config));
    let config_data = web::Data::new(config.clone());

    let server_address = config.server_address();
    let client_base_url = config.client_base_url.clone();
    log::info!("Server starting on http://{}", server_address);

    HttpServer::new(move || {
        App::new()
            .app_data(config_data.clone())
            .app_data(app_state.clone())
            .wrap(
                Cors::default()
                    .allowed_origin(&client_base_url)
                    .allowed_methods(vec!["GET", "POST", "PUT", "DELETE", "OPTIONS"])
                    .allowed_headers(vec![
                        "Authorization",
                        "Content-Type",
                        "Accept",
                        "X-Requested-With",
                        "X-Correlation-ID",
                    ])
                    .max_age(3600),
            )
            .wrap(RequestIdMiddleware)
            .wrap(Logger::new(
                r#"%a "%r" %s %b "%{User-Agent}i" %T correlation_id=%{x-correlation-id}o"#,
            ))
            .service(hello)
            .service(health)
            .configure(routes::configure)
    })
    .bind(&server_address)?
    .run()
    .await
    .map_err(|e| anyhow::anyhow!("Server error: {}", e))
}
