use actix_web::web;

use crate::handlers::{home::home, system::health_check};

mod leads;
mod json_error;

pub use json_error::INVALID_REQUEST_BODY;

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(home);
    cfg.service(health_check);

    cfg.service(
        web::scope("/api")
            .configure(leads::config_routes)
    );

    cfg.configure(json_error::config_routes);
}
