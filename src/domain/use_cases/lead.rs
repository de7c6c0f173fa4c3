use std::sync::Arc;

use tracing::{info, warn};
use validator::Validate;

use crate::{
    entities::lead::{
        Lead, LeadCreatedResponse, LeadDeletedResponse, LeadInsert, LeadStats, LeadStatus,
        NewLeadRequest, UpdateLeadStatusRequest,
    },
    errors::AppError,
    limiter::rate_limiter::{RateLimitPolicy, RateLimitStore},
    repositories::lead::LeadRepository,
    utils::valid_uuid::{truncate_for_log, valid_uuid},
};

pub const LEAD_CREATED: &str = "Заявка успешно отправлена";
pub const LEAD_DELETED: &str = "Заявка успешно удалена";
pub const INVALID_STATUS: &str = "Неверный статус";

const LOG_PREVIEW_CHARS: usize = 64;

/// Lead intake pipeline: rate limit, validation and persistence.
/// Takes plain values so it can run without an HTTP runtime.
pub struct LeadHandler<R>
where
    R: LeadRepository,
{
    pub lead_repo: R,
    pub limiter: Arc<dyn RateLimitStore>,
    pub policy: RateLimitPolicy,
}

impl<R> LeadHandler<R>
where
    R: LeadRepository,
{
    pub fn new(lead_repo: R, limiter: Arc<dyn RateLimitStore>, policy: RateLimitPolicy) -> Self {
        LeadHandler { lead_repo, limiter, policy }
    }

    /// Handles a contact form submission from `client_key`.
    pub async fn create_lead(
        &self,
        client_key: &str,
        request: NewLeadRequest,
    ) -> Result<LeadCreatedResponse, AppError> {
        self.enforce_rate_limit(client_key).await?;

        request.validate()?;

        let insert = LeadInsert::from(request);
        let lead = self.lead_repo.create_lead(&insert).await?;

        info!(
            operation = "create_lead",
            lead_id = %lead.id,
            lead_name = %truncate_for_log(&lead.name, LOG_PREVIEW_CHARS),
            message_preview = %lead.message.as_deref().map(|m| truncate_for_log(m, LOG_PREVIEW_CHARS)).unwrap_or_default(),
            "Lead created"
        );

        Ok(LeadCreatedResponse {
            success: true,
            message: LEAD_CREATED.to_string(),
            id: lead.id,
        })
    }

    /// Lists leads newest first, optionally restricted to one status.
    pub async fn list_leads(&self, status: Option<&str>) -> Result<Vec<Lead>, AppError> {
        let filter = status
            .filter(|s| !s.trim().is_empty() && s.trim() != "all")
            .map(parse_status)
            .transpose()?;

        self.lead_repo.list_leads(filter).await
    }

    /// Retrieves a lead by its ID
    pub async fn get_lead(&self, id: &str) -> Result<Lead, AppError> {
        let valid_id = valid_uuid(id)?;
        self.lead_repo.get_lead_by_id(&valid_id).await
    }

    /// Sets a new status. Transitions are not restricted.
    pub async fn update_lead_status(
        &self,
        id: &str,
        request: &UpdateLeadStatusRequest,
    ) -> Result<Lead, AppError> {
        let valid_id = valid_uuid(id)?;
        let status = parse_status(&request.status)?;

        let lead = self.lead_repo.update_lead_status(&valid_id, status).await?;

        info!(
            operation = "update_lead_status",
            lead_id = %lead.id,
            status = %status,
            requested = %truncate_for_log(&request.status, LOG_PREVIEW_CHARS),
            "Lead status updated"
        );

        Ok(lead)
    }

    /// Deletes a lead by its ID
    pub async fn delete_lead(&self, id: &str) -> Result<LeadDeletedResponse, AppError> {
        let valid_id = valid_uuid(id)?;

        self.lead_repo.delete_lead(&valid_id).await?;

        info!(operation = "delete_lead", lead_id = %valid_id, "Lead deleted");

        Ok(LeadDeletedResponse {
            message: LEAD_DELETED.to_string(),
        })
    }

    pub async fn lead_stats(&self) -> Result<LeadStats, AppError> {
        self.lead_repo.count_leads_by_status().await
    }

    async fn enforce_rate_limit(&self, client_key: &str) -> Result<(), AppError> {
        match self.limiter.increment_and_check(client_key, &self.policy).await {
            Ok(decision) if decision.allowed => Ok(()),
            Ok(decision) => {
                warn!(
                    client = %client_key,
                    retry_after_secs = decision.retry_after.as_secs(),
                    "Security event: lead submission rate limit exceeded"
                );
                Err(AppError::RateLimited { retry_after: decision.retry_after })
            }
            // Fail open.
            Err(e) => {
                warn!(client = %client_key, error = %e, "Rate limiter unavailable, allowing request");
                Ok(())
            }
        }
    }
}

fn parse_status(raw: &str) -> Result<LeadStatus, AppError> {
    raw.parse::<LeadStatus>()
        .map_err(|_| AppError::BadRequest(INVALID_STATUS.to_string()))
}
