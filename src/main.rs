use std::{net::TcpListener, sync::Arc};

use actix_web::web;
use gardenfab_backend::{
    build_rate_limiter,
    db::postgres::{create_pool, run_migrations},
    graceful_shutdown::stop_on_signal,
    handlers::system::START_TIME,
    repositories::sqlx_repo::SqlxLeadRepo,
    settings::AppConfig,
    startup,
    telemetry::init_tracing,
    AppState,
};
use once_cell::sync::Lazy;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    Lazy::force(&START_TIME);

    let config = match AppConfig::new() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            std::process::exit(1);
        }
    };

    init_tracing(config.default_log_filter(), config.log_json);
    tracing::info!("Loaded configuration: {:?}", config);

    let pool = match create_pool(&config.database_url, config.database_max_connections).await {
        Ok(pool) => pool,
        Err(e) => {
            tracing::error!("Failed to create database connection pool: {}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = run_migrations(&pool).await {
        tracing::error!("Failed to apply database migrations: {}", e);
        std::process::exit(1);
    }

    let app_state = web::Data::new(AppState::new(
        &config,
        Arc::new(SqlxLeadRepo::new(pool)),
        build_rate_limiter(&config),
    ));

    let server_addr = format!("{}:{}", config.host, config.port);
    let listener = TcpListener::bind(&server_addr)?;

    tracing::info!(
        "Starting {} v{} on {}",
        config.name,
        env!("CARGO_PKG_VERSION"),
        server_addr
    );

    let server = startup::run(listener, app_state, &config)?;
    tokio::spawn(stop_on_signal(server.handle()));

    server.await
}
