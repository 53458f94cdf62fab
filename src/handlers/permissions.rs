// src/handlers/permissions.rs

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
    models::permission::{GrantPermissionsPayload, Permission, PermissionPayload},
};

// =============================================================================
//  CATÁLOGO (somente organizador altera)
// =============================================================================

// POST /api/permissions
#[utoipa::path(
    post,
    path = "/api/permissions",
    tag = "Permissions",
    request_body = PermissionPayload,
    responses(
        (status = 201, description = "Permissão criada", body = Permission),
        (status = 409, description = "Nome ou código já existe")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_permission(
    State(app_state): State<AppState>,
    AuthenticatedUser(caller): AuthenticatedUser,
    Json(payload): Json<PermissionPayload>,
) -> Result<impl IntoResponse, AppError> {
    caller.require_organiser()?;
    payload.validate()?;

    let permission = app_state.permission_service
        .create(&app_state.db_pool, &payload)
        .await?;

    Ok((StatusCode::CREATED, Json(permission)))
}

// GET /api/permissions
#[utoipa::path(
    get,
    path = "/api/permissions",
    tag = "Permissions",
    responses(
        (status = 200, description = "Catálogo de permissões", body = Vec<Permission>)
    ),
    security(("api_jwt" = []))
)]
pub async fn list_permissions(
    State(app_state): State<AppState>,
    AuthenticatedUser(_caller): AuthenticatedUser,
) -> Result<impl IntoResponse, AppError> {
    let permissions = app_state.permission_service.list(&app_state.db_pool).await?;

    Ok((StatusCode::OK, Json(permissions)))
}

// PUT /api/permissions/{permission_id}
#[utoipa::path(
    put,
    path = "/api/permissions/{permission_id}",
    tag = "Permissions",
    request_body = PermissionPayload,
    params(
        ("permission_id" = Uuid, Path, description = "ID da permissão")
    ),
    responses(
        (status = 200, description = "Permissão atualizada", body = Permission),
        (status = 404, description = "Permissão não encontrada")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_permission(
    State(app_state): State<AppState>,
    AuthenticatedUser(caller): AuthenticatedUser,
    Path(permission_id): Path<Uuid>,
    Json(payload): Json<PermissionPayload>,
) -> Result<impl IntoResponse, AppError> {
    caller.require_organiser()?;
    payload.validate()?;

    let permission = app_state.permission_service
        .update(&app_state.db_pool, permission_id, &payload)
        .await?;

    Ok((StatusCode::OK, Json(permission)))
}

// DELETE /api/permissions/{permission_id}
#[utoipa::path(
    delete,
    path = "/api/permissions/{permission_id}",
    tag = "Permissions",
    params(
        ("permission_id" = Uuid, Path, description = "ID da permissão")
    ),
    responses(
        (status = 204, description = "Permissão removida (e revogada de todos os agentes)"),
        (status = 404, description = "Permissão não encontrada")
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_permission(
    State(app_state): State<AppState>,
    AuthenticatedUser(caller): AuthenticatedUser,
    Path(permission_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    caller.require_organiser()?;

    app_state.permission_service
        .delete(&app_state.db_pool, permission_id)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

// =============================================================================
//  CONCESSÕES POR AGENTE
// =============================================================================

// GET /api/agents/{agent_id}/permissions
#[utoipa::path(
    get,
    path = "/api/agents/{agent_id}/permissions",
    tag = "Permissions",
    params(
        ("agent_id" = Uuid, Path, description = "ID do agente")
    ),
    responses(
        (status = 200, description = "Permissões do agente", body = Vec<Permission>),
        (status = 403, description = "Agente consultando outro agente")
    ),
    security(("api_jwt" = []))
)]
pub async fn list_agent_permissions(
    State(app_state): State<AppState>,
    AuthenticatedUser(caller): AuthenticatedUser,
    Path(agent_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    // Agente só consulta as próprias
    if caller.agent_id.is_some_and(|own| own != agent_id) {
        return Err(AppError::Forbidden);
    }

    let permissions = app_state.permission_service
        .agent_grants(&app_state.db_pool, caller.organisation_id, agent_id)
        .await?;

    Ok((StatusCode::OK, Json(permissions)))
}

// PUT /api/agents/{agent_id}/permissions
#[utoipa::path(
    put,
    path = "/api/agents/{agent_id}/permissions",
    tag = "Permissions",
    request_body = GrantPermissionsPayload,
    params(
        ("agent_id" = Uuid, Path, description = "ID do agente")
    ),
    responses(
        (status = 200, description = "Novo conjunto de permissões do agente", body = Vec<Permission>),
        (status = 400, description = "Código de permissão desconhecido"),
        (status = 404, description = "Agente não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn replace_agent_permissions(
    State(app_state): State<AppState>,
    AuthenticatedUser(caller): AuthenticatedUser,
    Path(agent_id): Path<Uuid>,
    Json(payload): Json<GrantPermissionsPayload>,
) -> Result<impl IntoResponse, AppError> {
    caller.require_organiser()?;
    payload.validate()?;

    let permissions = app_state.permission_service
        .replace_grants(&app_state.db_pool, caller.organisation_id, agent_id, &payload.codes)
        .await?;

    Ok((StatusCode::OK, Json(permissions)))
}
