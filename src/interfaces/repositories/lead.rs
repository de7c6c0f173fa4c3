use std::sync::Arc;

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    entities::lead::{Lead, LeadInsert, LeadStats, LeadStatus},
    errors::{AppError, LEAD_NOT_FOUND},
    repositories::sqlx_repo::SqlxLeadRepo,
};

const LEAD_COLUMNS: &str = "id, name, phone, message, status, created_at, updated_at";

/// Persistence boundary for leads. The only component that mutates stored rows.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LeadRepository: Send + Sync {
    async fn create_lead(&self, lead: &LeadInsert) -> Result<Lead, AppError>;
    async fn list_leads(&self, status: Option<LeadStatus>) -> Result<Vec<Lead>, AppError>;
    async fn get_lead_by_id(&self, id: &Uuid) -> Result<Lead, AppError>;
    async fn update_lead_status(&self, id: &Uuid, status: LeadStatus) -> Result<Lead, AppError>;
    async fn delete_lead(&self, id: &Uuid) -> Result<(), AppError>;
    async fn count_leads_by_status(&self) -> Result<LeadStats, AppError>;
    async fn check_connection(&self) -> Result<(), AppError>;
}

#[async_trait]
impl<T> LeadRepository for Arc<T>
where
    T: LeadRepository + ?Sized,
{
    async fn create_lead(&self, lead: &LeadInsert) -> Result<Lead, AppError> {
        (**self).create_lead(lead).await
    }

    async fn list_leads(&self, status: Option<LeadStatus>) -> Result<Vec<Lead>, AppError> {
        (**self).list_leads(status).await
    }

    async fn get_lead_by_id(&self, id: &Uuid) -> Result<Lead, AppError> {
        (**self).get_lead_by_id(id).await
    }

    async fn update_lead_status(&self, id: &Uuid, status: LeadStatus) -> Result<Lead, AppError> {
        (**self).update_lead_status(id, status).await
    }

    async fn delete_lead(&self, id: &Uuid) -> Result<(), AppError> {
        (**self).delete_lead(id).await
    }

    async fn count_leads_by_status(&self) -> Result<LeadStats, AppError> {
        (**self).count_leads_by_status().await
    }

    async fn check_connection(&self) -> Result<(), AppError> {
        (**self).check_connection().await
    }
}

impl SqlxLeadRepo {
    pub fn new(pool: PgPool) -> Self {
        SqlxLeadRepo { pool }
    }
}

#[async_trait]
impl LeadRepository for SqlxLeadRepo {
    async fn create_lead(&self, lead: &LeadInsert) -> Result<Lead, AppError> {
        let created = sqlx::query_as::<_, Lead>(&format!(
            r#"
            INSERT INTO leads (name, phone, message)
            VALUES ($1, $2, $3)
            RETURNING {LEAD_COLUMNS}
            "#
        ))
        .bind(&lead.name)
        .bind(&lead.phone)
        .bind(&lead.message)
        .fetch_one(&self.pool)
        .await?;

        Ok(created)
    }

    async fn list_leads(&self, status: Option<LeadStatus>) -> Result<Vec<Lead>, AppError> {
        let leads = sqlx::query_as::<_, Lead>(&format!(
            r#"
            SELECT {LEAD_COLUMNS} FROM leads
            WHERE ($1::lead_status IS NULL OR status = $1)
            ORDER BY created_at DESC
            "#
        ))
        .bind(status)
        .fetch_all(&self.pool)
        .await?;

        Ok(leads)
    }

    async fn get_lead_by_id(&self, id: &Uuid) -> Result<Lead, AppError> {
        sqlx::query_as::<_, Lead>(&format!("SELECT {LEAD_COLUMNS} FROM leads WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(LEAD_NOT_FOUND.into()))
    }

    async fn update_lead_status(&self, id: &Uuid, status: LeadStatus) -> Result<Lead, AppError> {
        sqlx::query_as::<_, Lead>(&format!(
            r#"
            UPDATE leads SET status = $2, updated_at = GREATEST(NOW(), updated_at)
            WHERE id = $1
            RETURNING {LEAD_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(status)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound(LEAD_NOT_FOUND.into()))
    }

    async fn delete_lead(&self, id: &Uuid) -> Result<(), AppError> {
        sqlx::query(r#"DELETE FROM leads WHERE id = $1"#)
            .bind(id)
            .execute(&self.pool)
            .await
            .map(|result| {
                if result.rows_affected() == 0 {
                    Err(AppError::NotFound(LEAD_NOT_FOUND.into()))
                } else {
                    Ok(())
                }
            })?
    }

    async fn count_leads_by_status(&self) -> Result<LeadStats, AppError> {
        let rows: Vec<(LeadStatus, i64)> = sqlx::query_as(
            r#"SELECT status, COUNT(*) FROM leads GROUP BY status"#
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(LeadStats::from_counts(rows))
    }

    async fn check_connection(&self) -> Result<(), AppError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
