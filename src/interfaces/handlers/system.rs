use actix_web::{web, get, HttpResponse, Responder};
use chrono::{DateTime, Utc};
use humantime::format_duration;
use once_cell::sync::Lazy;
use serde::Serialize;
use std::time::Duration;
use sysinfo::System;

use crate::{repositories::lead::LeadRepository, AppState};

/// Process start, forced in `main` before the server binds.
pub static START_TIME: Lazy<DateTime<Utc>> = Lazy::new(Utc::now);

#[derive(Serialize)]
struct HealthCheckResponse {
    status: &'static str,
    uptime: String,
    timestamp: String,
    start_at: String,
    database: &'static str,
    rate_limiter: &'static str,
    version: &'static str,
    memory_usage: String,
}

fn process_memory_usage() -> String {
    let mut sys = System::new();
    let pid = match sysinfo::get_current_pid() {
        Ok(pid) => pid,
        Err(_) => return "Unknown".to_string(),
    };
    sys.refresh_processes(sysinfo::ProcessesToUpdate::Some(&[pid]), true);
    sys.process(pid).map_or("Unknown".to_string(), |p| {
        format!("{:.2} MB", p.memory() as f64 / 1024.0 / 1024.0)
    })
}

#[get("/health")]
pub async fn health_check(state: web::Data<AppState>) -> impl Responder {
    let now_utc = Utc::now();
    let uptime_secs = now_utc.signed_duration_since(*START_TIME).num_seconds().max(0) as u64;

    let database = match state.lead_handler.lead_repo.check_connection().await {
        Ok(_) => "OK",
        Err(e) => {
            tracing::warn!("Health check database probe failed: {}", e);
            "Unavailable"
        }
    };

    let response = HealthCheckResponse {
        status: if database == "OK" { "healthy" } else { "degraded" },
        uptime: format_duration(Duration::from_secs(uptime_secs)).to_string(),
        timestamp: now_utc.to_rfc3339(),
        start_at: START_TIME.to_rfc3339(),
        database,
        rate_limiter: state.lead_handler.limiter.backend(),
        version: env!("CARGO_PKG_VERSION"),
        memory_usage: process_memory_usage(),
    };

    if database == "OK" {
        HttpResponse::Ok().json(response)
    } else {
        HttpResponse::ServiceUnavailable().json(response)
    }
}
