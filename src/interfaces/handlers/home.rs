use actix_web::{get, HttpResponse, Responder};

#[get("/")]
pub async fn home() -> impl Responder {
    HttpResponse::Ok().json(serde_json::json!({
        "message": "GardenFab leads API",
        "status": "Ok",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": {
            "leads": "/api/leads",
            "stats": "/api/leads/stats",
            "health": "/health"
        }
    }))
}
