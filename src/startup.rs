use std::net::TcpListener;

use actix_web::{dev::Server, middleware::NormalizePath, web, App, HttpServer};
use tracing_actix_web::TracingLogger;

use crate::{
    middlewares::security_headers::{cors, security_headers},
    routes::configure_routes,
    settings::AppConfig,
    AppState,
};

/// Builds the HTTP server on an already bound listener.
pub fn run(
    listener: TcpListener,
    app_state: web::Data<AppState>,
    config: &AppConfig,
) -> std::io::Result<Server> {
    let cors_config = config.clone();

    let server = HttpServer::new(move || {
        App::new()
            .app_data(app_state.clone())
            .wrap(NormalizePath::trim())
            .wrap(security_headers())
            .wrap(cors(&cors_config))
            .wrap(TracingLogger::default())
            .configure(configure_routes)
    })
    .listen(listener)?
    .workers(config.worker_count.max(1))
    .disable_signals()
    .run();

    Ok(server)
}
