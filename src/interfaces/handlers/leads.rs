use actix_web::{web, HttpRequest, HttpResponse, Responder};
use tracing::instrument;

use crate::{
    entities::lead::{LeadListQuery, NewLeadRequest, UpdateLeadStatusRequest},
    errors::AppError,
    utils::get_client_ip::get_client_ip,
    AppState,
};

#[instrument(skip(req, state, data))]
pub async fn create_lead(
    req: HttpRequest,
    state: web::Data<AppState>,
    data: web::Json<NewLeadRequest>,
) -> Result<impl Responder, AppError> {
    let client_key = get_client_ip(&req, state.trust_forwarded_for);

    let response = state
        .lead_handler
        .create_lead(&client_key, data.into_inner())
        .await?;

    Ok(HttpResponse::Created().json(response))
}

#[instrument(skip(state, query))]
pub async fn list_leads(
    state: web::Data<AppState>,
    query: web::Query<LeadListQuery>,
) -> Result<impl Responder, AppError> {
    let leads = state
        .lead_handler
        .list_leads(query.status.as_deref())
        .await?;

    Ok(HttpResponse::Ok().json(leads))
}

#[instrument(skip(state))]
pub async fn lead_stats(state: web::Data<AppState>) -> Result<impl Responder, AppError> {
    let stats = state.lead_handler.lead_stats().await?;
    Ok(HttpResponse::Ok().json(stats))
}

#[instrument(skip(lead_id, state))]
pub async fn get_lead(
    lead_id: web::Path<String>,
    state: web::Data<AppState>,
) -> Result<impl Responder, AppError> {
    let lead = state.lead_handler.get_lead(&lead_id).await?;
    Ok(HttpResponse::Ok().json(lead))
}

#[instrument(skip(lead_id, state, data))]
pub async fn update_lead_status(
    lead_id: web::Path<String>,
    state: web::Data<AppState>,
    data: web::Json<UpdateLeadStatusRequest>,
) -> Result<impl Responder, AppError> {
    let updated = state
        .lead_handler
        .update_lead_status(&lead_id, &data.into_inner())
        .await?;

    Ok(HttpResponse::Ok().json(updated))
}

#[instrument(skip(lead_id, state))]
pub async fn delete_lead(
    lead_id: web::Path<String>,
    state: web::Data<AppState>,
) -> Result<impl Responder, AppError> {
    let response = state.lead_handler.delete_lead(&lead_id).await?;
    Ok(HttpResponse::Ok().json(response))
}
