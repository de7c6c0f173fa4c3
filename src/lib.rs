use std::sync::Arc;

mod domain;
mod interfaces;
mod infrastructure;
pub mod errors;
pub mod settings;
pub mod graceful_shutdown;
pub mod startup;
pub mod telemetry;

pub use domain::{entities, use_cases};
pub use interfaces::{handlers, repositories, middlewares, routes};
pub use infrastructure::{db, limiter, utils};

use limiter::rate_limiter::{InMemoryRateLimiter, RateLimitStore, RedisRateLimiter};
use repositories::lead::LeadRepository;
use settings::AppConfig;
use use_cases::lead::LeadHandler;

const REDIS_KEY_PREFIX: &str = "rl:lead";

pub type DynLeadRepo = Arc<dyn LeadRepository>;
pub type AppLeadHandler = LeadHandler<DynLeadRepo>;

pub struct AppState {
    pub lead_handler: AppLeadHandler,
    pub trust_forwarded_for: bool,
}

impl AppState {
    pub fn new(
        config: &AppConfig,
        lead_repo: DynLeadRepo,
        limiter: Arc<dyn RateLimitStore>,
    ) -> Self {
        let lead_handler = LeadHandler::new(lead_repo, limiter, config.rate_limit_policy());

        AppState {
            lead_handler,
            trust_forwarded_for: config.trust_forwarded_for,
        }
    }
}

/// Shared Redis counters when `redis_url` is set, otherwise a process-local map.
pub fn build_rate_limiter(config: &AppConfig) -> Arc<dyn RateLimitStore> {
    if let Some(url) = config.redis_url.as_deref() {
        match RedisRateLimiter::from_url(url, REDIS_KEY_PREFIX) {
            Ok(limiter) => {
                tracing::info!("Using Redis rate limiter");
                return Arc::new(limiter);
            }
            Err(e) => {
                tracing::error!("Redis rate limiter unavailable, falling back to memory: {}", e);
            }
        }
    }
    Arc::new(InMemoryRateLimiter::new(config.rate_limit_max_keys))
}
