// src/handlers/stats.rs

use axum::{
    extract::{Path, State},
    response::{IntoResponse, Response},
    Json,
};
use axum_extra::extract::Query;
use chrono::NaiveDate;
use serde::Deserialize;
use uuid::Uuid;

use crate::{
    common::{dates::{blank_date, DateWindow}, error::AppError, export::wants_export},
    config::AppState,
    middleware::auth::AuthenticatedUser,
    models::lead::blank_uuids,
    models::stats::{AgentStats, DashboardSummary, StatsReport},
};

#[derive(Debug, Default, Deserialize)]
pub struct WindowQuery {
    #[serde(default, deserialize_with = "blank_date::deserialize")]
    pub start_date: Option<NaiveDate>,
    #[serde(default, deserialize_with = "blank_date::deserialize")]
    pub end_date: Option<NaiveDate>,
    // Multi-seleção: ?agent=..&agent=..
    #[serde(default, deserialize_with = "blank_uuids::deserialize")]
    pub agent: Vec<Uuid>,
    pub export: Option<u8>,
}

// GET /api/stats?start_date=2024-01-01&end_date=2024-01-31&agent=..(&export=1)
#[utoipa::path(
    get,
    path = "/api/stats",
    tag = "Stats",
    params(
        ("start_date" = String, Query, description = "AAAA-MM-DD (obrigatório)"),
        ("end_date" = Option<String>, Query, description = "AAAA-MM-DD; ausente => só start_date"),
        ("export" = Option<u8>, Query, description = "1 => CSV"),
        ("agent" = Option<Vec<Uuid>>, Query, description = "Vazio => todos os agentes")
    ),
    responses(
        (status = 200, description = "Estatísticas por agente (ou CSV com export=1)", body = StatsReport),
        (status = 400, description = "Janela de datas inválida"),
        (status = 403, description = "Agente pedindo estatística de outro")
    ),
    security(("api_jwt" = []))
)]
pub async fn agent_stats(
    State(app_state): State<AppState>,
    AuthenticatedUser(caller): AuthenticatedUser,
    Query(query): Query<WindowQuery>,
) -> Result<Response, AppError> {
    let window = DateWindow::resolve(query.start_date, query.end_date)?;

    let report = app_state.stats_service
        .report(&app_state.db_pool, caller.scope(), &query.agent, window)
        .await?;

    if wants_export(query.export) {
        return report.to_csv().into_response();
    }
    Ok(Json(report).into_response())
}

// GET /api/stats/agents/{agent_id}?start_date=..&end_date=..
#[utoipa::path(
    get,
    path = "/api/stats/agents/{agent_id}",
    tag = "Stats",
    params(
        ("agent_id" = Uuid, Path, description = "ID do agente"),
        ("start_date" = String, Query, description = "AAAA-MM-DD (obrigatório)"),
        ("end_date" = Option<String>, Query, description = "AAAA-MM-DD; ausente => só start_date")
    ),
    responses(
        (status = 200, description = "Estatísticas do agente", body = AgentStats),
        (status = 404, description = "Agente não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn single_agent_stats(
    State(app_state): State<AppState>,
    AuthenticatedUser(caller): AuthenticatedUser,
    Path(agent_id): Path<Uuid>,
    Query(query): Query<WindowQuery>,
) -> Result<Response, AppError> {
    // Agente só consulta a si mesmo
    if caller.agent_id.is_some_and(|own| own != agent_id) {
        return Err(AppError::Forbidden);
    }
    let window = DateWindow::resolve(query.start_date, query.end_date)?;

    let stats = app_state.stats_service
        .calculate_stats(&app_state.db_pool, caller.organisation_id, agent_id, window)
        .await?;

    Ok(Json(stats).into_response())
}

// GET /api/dashboard?start_date=..&end_date=..(&export=1)
#[utoipa::path(
    get,
    path = "/api/dashboard",
    tag = "Stats",
    params(
        ("start_date" = String, Query, description = "AAAA-MM-DD (obrigatório)"),
        ("end_date" = Option<String>, Query, description = "AAAA-MM-DD; ausente => só start_date"),
        ("export" = Option<u8>, Query, description = "1 => CSV")
    ),
    responses(
        (status = 200, description = "Resumo da organização (ou CSV com export=1)", body = DashboardSummary)
    ),
    security(("api_jwt" = []))
)]
pub async fn dashboard(
    State(app_state): State<AppState>,
    AuthenticatedUser(caller): AuthenticatedUser,
    Query(query): Query<WindowQuery>,
) -> Result<Response, AppError> {
    caller.require_organiser()?;
    let window = DateWindow::resolve(query.start_date, query.end_date)?;

    let summary = app_state.stats_service
        .dashboard(&app_state.db_pool, caller.organisation_id, window)
        .await?;

    if wants_export(query.export) {
        return summary.to_csv().into_response();
    }
    Ok(Json(summary).into_response())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Uri;

    fn window_query(uri: &str) -> WindowQuery {
        let uri: Uri = uri.parse().unwrap();
        Query::<WindowQuery>::try_from_uri(&uri).unwrap().0
    }

    #[test]
    fn blank_agent_selection_means_every_agent() {
        let q = window_query("/api/stats?start_date=2024-01-01&end_date=&agent=");

        assert!(q.agent.is_empty());
        assert_eq!(q.end_date, None);
        assert_eq!(q.start_date, NaiveDate::from_ymd_opt(2024, 1, 1));
    }

    #[test]
    fn selected_agents_are_kept_in_order() {
        let (a, b) = (Uuid::from_u128(1), Uuid::from_u128(2));
        let q = window_query(&format!("/api/stats?start_date=2024-01-01&agent={a}&agent=&agent={b}&export=1"));

        assert_eq!(q.agent, vec![a, b]);
        assert_eq!(q.export, Some(1));
    }
}
