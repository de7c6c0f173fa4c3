use actix_web::web;

use crate::handlers::leads;

pub fn config_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/leads")
            .service(
                web::resource("")
                    .route(web::post().to(leads::create_lead))
                    .route(web::get().to(leads::list_leads))
            )
            .service(
                web::resource("/stats")
                    .route(web::get().to(leads::lead_stats))
            )
            .service(
                web::resource("/{lead_id}")
                    .route(web::get().to(leads::get_lead))
                    .route(web::patch().to(leads::update_lead_status))
                    .route(web::delete().to(leads::delete_lead))
            )
    );
}
