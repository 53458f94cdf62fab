// src/handlers/leads.rs

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use axum_extra::extract::Query;
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::{error::AppError, export::wants_export},
    config::AppState,
    middleware::auth::AuthenticatedUser,
    models::lead::{
        FacetChoice, FacetField, ImportRow, ImportSummary, LeadFilter, LeadOrdering, LeadPage,
        LeadRow, ListParams, LogCallPayload, Page, ReassignSummary,
    },
};

// =============================================================================
//  PAYLOADS
// =============================================================================

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReassignPayload {
    #[validate(length(min = 1, message = "required"))]
    pub lead_ids: Vec<Uuid>,
    // Vazio => todos os agentes da organização
    #[serde(default)]
    pub agent_ids: Vec<Uuid>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DeleteSelectedPayload {
    #[validate(length(min = 1, message = "required"))]
    pub lead_ids: Vec<Uuid>,
}

// =============================================================================
//  BUSCA E EXPORTAÇÃO
// =============================================================================

// GET /api/leads?source=a&source=b&order_by=country_asc&page=2 (ou &export=1)
#[utoipa::path(
    get,
    path = "/api/leads",
    tag = "Leads",
    params(
        ("first_name" = Option<String>, Query),
        ("last_name" = Option<String>, Query),
        ("email" = Option<String>, Query, description = "Prefixo"),
        ("phone_number" = Option<String>, Query),
        ("source" = Option<Vec<String>>, Query),
        ("service" = Option<Vec<String>>, Query),
        ("country" = Option<Vec<String>>, Query),
        ("campaign" = Option<Vec<String>>, Query),
        ("agent" = Option<Vec<Uuid>>, Query),
        ("category" = Option<Vec<Uuid>>, Query),
        ("tag" = Option<Vec<Uuid>>, Query),
        ("start_date" = Option<String>, Query),
        ("end_date" = Option<String>, Query),
        ("order_by" = Option<String>, Query, description = "country|campaign|agent|category|date + _asc|_desc"),
        ("page" = Option<i64>, Query),
        ("per_page" = Option<i64>, Query),
        ("export" = Option<u8>, Query, description = "1 => CSV")
    ),
    responses(
        (status = 200, description = "Página de leads (ou CSV com export=1)", body = LeadPage),
        (status = 400, description = "order_by desconhecido")
    ),
    security(("api_jwt" = []))
)]
pub async fn list_leads(
    State(app_state): State<AppState>,
    AuthenticatedUser(caller): AuthenticatedUser,
    Query(filter): Query<LeadFilter>,
    Query(params): Query<ListParams>,
) -> Result<Response, AppError> {
    let ordering = LeadOrdering::parse(params.order_by.as_deref())?;

    if wants_export(params.export) {
        let export = app_state.lead_service
            .export(&app_state.db_pool, caller.scope(), &filter, ordering)
            .await?;
        return export.into_response();
    }

    let page = Page::new(params.page, params.per_page);
    let leads = app_state.lead_service
        .search(&app_state.db_pool, caller.scope(), &filter, ordering, page)
        .await?;

    Ok(Json(leads).into_response())
}

// GET /api/leads/facets/{field}
#[utoipa::path(
    get,
    path = "/api/leads/facets/{field}",
    tag = "Leads",
    params(
        ("field" = String, Path, description = "source | service | country | campaign")
    ),
    responses(
        (status = 200, description = "Valores distintos da faceta", body = Vec<FacetChoice>)
    ),
    security(("api_jwt" = []))
)]
pub async fn list_facet_choices(
    State(app_state): State<AppState>,
    AuthenticatedUser(caller): AuthenticatedUser,
    Path(field): Path<FacetField>,
) -> Result<impl IntoResponse, AppError> {
    let choices = app_state.lead_service
        .facet_choices(&app_state.db_pool, caller.scope(), field)
        .await?;

    Ok((StatusCode::OK, Json(choices)))
}

// =============================================================================
//  IMPORTAÇÃO E ATRIBUIÇÃO (somente organizador)
// =============================================================================

// POST /api/leads/import
#[utoipa::path(
    post,
    path = "/api/leads/import",
    tag = "Leads",
    request_body = Vec<ImportRow>,
    responses(
        (status = 201, description = "Lote importado sem agente", body = ImportSummary),
        (status = 403, description = "Somente organizador")
    ),
    security(("api_jwt" = []))
)]
pub async fn import_unassigned(
    State(app_state): State<AppState>,
    AuthenticatedUser(caller): AuthenticatedUser,
    Json(batch): Json<Vec<ImportRow>>,
) -> Result<impl IntoResponse, AppError> {
    caller.require_organiser()?;

    let summary = app_state.assignment_service
        .assign_unassigned(&app_state.db_pool, caller.organisation_id, batch)
        .await?;

    Ok((StatusCode::CREATED, Json(summary)))
}

// POST /api/leads/import/agents/{agent_id}
#[utoipa::path(
    post,
    path = "/api/leads/import/agents/{agent_id}",
    tag = "Leads",
    request_body = Vec<ImportRow>,
    params(
        ("agent_id" = Uuid, Path, description = "ID do agente")
    ),
    responses(
        (status = 201, description = "Lote importado para o agente", body = ImportSummary),
        (status = 404, description = "Agente não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn import_to_agent(
    State(app_state): State<AppState>,
    AuthenticatedUser(caller): AuthenticatedUser,
    Path(agent_id): Path<Uuid>,
    Json(batch): Json<Vec<ImportRow>>,
) -> Result<impl IntoResponse, AppError> {
    caller.require_organiser()?;

    let summary = app_state.assignment_service
        .assign_to_agent(&app_state.db_pool, caller.organisation_id, agent_id, batch)
        .await?;

    Ok((StatusCode::CREATED, Json(summary)))
}

// POST /api/leads/import/random
#[utoipa::path(
    post,
    path = "/api/leads/import/random",
    tag = "Leads",
    request_body = Vec<ImportRow>,
    responses(
        (status = 201, description = "Lote dividido entre os agentes", body = ImportSummary),
        (status = 400, description = "Organização sem agentes")
    ),
    security(("api_jwt" = []))
)]
pub async fn import_randomly(
    State(app_state): State<AppState>,
    AuthenticatedUser(caller): AuthenticatedUser,
    Json(batch): Json<Vec<ImportRow>>,
) -> Result<impl IntoResponse, AppError> {
    caller.require_organiser()?;

    let summary = app_state.assignment_service
        .assign_randomly(&app_state.db_pool, caller.organisation_id, batch)
        .await?;

    Ok((StatusCode::CREATED, Json(summary)))
}

// POST /api/leads/reassign
#[utoipa::path(
    post,
    path = "/api/leads/reassign",
    tag = "Leads",
    request_body = ReassignPayload,
    responses(
        (status = 200, description = "Leads redistribuídos", body = ReassignSummary)
    ),
    security(("api_jwt" = []))
)]
pub async fn reassign_selected(
    State(app_state): State<AppState>,
    AuthenticatedUser(caller): AuthenticatedUser,
    Json(payload): Json<ReassignPayload>,
) -> Result<impl IntoResponse, AppError> {
    caller.require_organiser()?;
    payload.validate()?;

    let summary = app_state.assignment_service
        .reassign_selected(&app_state.db_pool, caller.organisation_id, &payload.lead_ids, &payload.agent_ids)
        .await?;

    Ok((StatusCode::OK, Json(summary)))
}

// POST /api/leads/delete-selected
#[utoipa::path(
    post,
    path = "/api/leads/delete-selected",
    tag = "Leads",
    request_body = DeleteSelectedPayload,
    responses(
        (status = 200, description = "Quantidade de leads removidos")
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_selected(
    State(app_state): State<AppState>,
    AuthenticatedUser(caller): AuthenticatedUser,
    Json(payload): Json<DeleteSelectedPayload>,
) -> Result<impl IntoResponse, AppError> {
    caller.require_organiser()?;
    payload.validate()?;

    let deleted = app_state.assignment_service
        .delete_selected(&app_state.db_pool, caller.organisation_id, &payload.lead_ids)
        .await?;

    Ok((StatusCode::OK, Json(serde_json::json!({ "deleted": deleted }))))
}

// =============================================================================
//  LIGAÇÕES
// =============================================================================

// POST /api/leads/{lead_id}/call
#[utoipa::path(
    post,
    path = "/api/leads/{lead_id}/call",
    tag = "Leads",
    request_body = LogCallPayload,
    params(
        ("lead_id" = Uuid, Path, description = "ID do lead")
    ),
    responses(
        (status = 200, description = "Ligação registrada", body = LeadRow),
        (status = 404, description = "Lead ou categoria não encontrados")
    ),
    security(("api_jwt" = []))
)]
pub async fn log_call(
    State(app_state): State<AppState>,
    AuthenticatedUser(caller): AuthenticatedUser,
    Path(lead_id): Path<Uuid>,
    Json(payload): Json<LogCallPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let lead = app_state.assignment_service
        .log_call(&app_state.db_pool, caller.scope(), lead_id, &payload)
        .await?;

    Ok((StatusCode::OK, Json(lead)))
}
