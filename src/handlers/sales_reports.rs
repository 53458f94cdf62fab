// src/handlers/sales_reports.rs

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::error::AppError,
    config::AppState,
    middleware::auth::AuthenticatedUser,
    models::sales_report::{CreateSalesReportPayload, SalesReport},
};

// POST /api/sales-reports
#[utoipa::path(
    post,
    path = "/api/sales-reports",
    tag = "Sales Reports",
    request_body = CreateSalesReportPayload,
    responses(
        (status = 201, description = "Avaliação registrada", body = SalesReport),
        (status = 409, description = "Já existe avaliação no mês")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_sales_report(
    State(app_state): State<AppState>,
    AuthenticatedUser(caller): AuthenticatedUser,
    Json(payload): Json<CreateSalesReportPayload>,
) -> Result<impl IntoResponse, AppError> {
    caller.require_organiser()?;
    payload.validate()?;

    let report = app_state.sales_report_service
        .create(&app_state.db_pool, caller.organisation_id, caller.user_id, &payload)
        .await?;

    Ok((StatusCode::CREATED, Json(report)))
}

// GET /api/sales-reports
#[utoipa::path(
    get,
    path = "/api/sales-reports",
    tag = "Sales Reports",
    responses(
        (status = 200, description = "Avaliações da organização", body = Vec<SalesReport>)
    ),
    security(("api_jwt" = []))
)]
pub async fn list_sales_reports(
    State(app_state): State<AppState>,
    AuthenticatedUser(caller): AuthenticatedUser,
) -> Result<impl IntoResponse, AppError> {
    let reports = app_state.sales_report_service
        .list(&app_state.db_pool, caller.organisation_id)
        .await?;

    Ok((StatusCode::OK, Json(reports)))
}

// GET /api/sales-reports/{report_id}
#[utoipa::path(
    get,
    path = "/api/sales-reports/{report_id}",
    tag = "Sales Reports",
    params(
        ("report_id" = Uuid, Path, description = "ID da avaliação")
    ),
    responses(
        (status = 200, description = "Avaliação", body = SalesReport),
        (status = 404, description = "Avaliação não encontrada")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_sales_report(
    State(app_state): State<AppState>,
    AuthenticatedUser(caller): AuthenticatedUser,
    Path(report_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let report = app_state.sales_report_service
        .get(&app_state.db_pool, caller.organisation_id, report_id)
        .await?;

    Ok((StatusCode::OK, Json(report)))
}
