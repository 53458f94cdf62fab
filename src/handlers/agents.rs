// src/handlers/agents.rs

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
    models::agent::{Agent, Category, CreateAgentPayload, NamePayload, Tag},
};

// =============================================================================
//  AGENTES
// =============================================================================

// POST /api/agents
#[utoipa::path(
    post,
    path = "/api/agents",
    tag = "Agents",
    request_body = CreateAgentPayload,
    responses(
        (status = 201, description = "Agente criado", body = Agent),
        (status = 409, description = "Usuário já é agente")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_agent(
    State(app_state): State<AppState>,
    AuthenticatedUser(caller): AuthenticatedUser,
    Json(payload): Json<CreateAgentPayload>,
) -> Result<impl IntoResponse, AppError> {
    caller.require_organiser()?;
    payload.validate()?;

    let agent = app_state.agent_service
        .create_agent(&app_state.db_pool, caller.organisation_id, &payload)
        .await?;

    Ok((StatusCode::CREATED, Json(agent)))
}

// GET /api/agents
#[utoipa::path(
    get,
    path = "/api/agents",
    tag = "Agents",
    responses(
        (status = 200, description = "Agentes da organização", body = Vec<Agent>)
    ),
    security(("api_jwt" = []))
)]
pub async fn list_agents(
    State(app_state): State<AppState>,
    AuthenticatedUser(caller): AuthenticatedUser,
) -> Result<impl IntoResponse, AppError> {
    let agents = app_state.agent_service
        .list_agents(&app_state.db_pool, caller.organisation_id)
        .await?;

    Ok((StatusCode::OK, Json(agents)))
}

// DELETE /api/agents/{agent_id}
#[utoipa::path(
    delete,
    path = "/api/agents/{agent_id}",
    tag = "Agents",
    params(
        ("agent_id" = Uuid, Path, description = "ID do agente")
    ),
    responses(
        (status = 204, description = "Agente removido; leads ficam sem dono"),
        (status = 404, description = "Agente não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_agent(
    State(app_state): State<AppState>,
    AuthenticatedUser(caller): AuthenticatedUser,
    Path(agent_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    caller.require_organiser()?;

    app_state.agent_service
        .delete_agent(&app_state.db_pool, caller.organisation_id, agent_id)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

// =============================================================================
//  CATEGORIAS
// =============================================================================

// POST /api/categories
#[utoipa::path(
    post,
    path = "/api/categories",
    tag = "Taxonomy",
    request_body = NamePayload,
    responses(
        (status = 201, description = "Categoria criada", body = Category),
        (status = 409, description = "Categoria já existe")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_category(
    State(app_state): State<AppState>,
    AuthenticatedUser(caller): AuthenticatedUser,
    Json(payload): Json<NamePayload>,
) -> Result<impl IntoResponse, AppError> {
    caller.require_organiser()?;
    payload.validate()?;

    let category = app_state.agent_service
        .create_category(&app_state.db_pool, caller.organisation_id, &payload.name)
        .await?;

    Ok((StatusCode::CREATED, Json(category)))
}

// GET /api/categories
#[utoipa::path(
    get,
    path = "/api/categories",
    tag = "Taxonomy",
    responses(
        (status = 200, description = "Categorias da organização", body = Vec<Category>)
    ),
    security(("api_jwt" = []))
)]
pub async fn list_categories(
    State(app_state): State<AppState>,
    AuthenticatedUser(caller): AuthenticatedUser,
) -> Result<impl IntoResponse, AppError> {
    let categories = app_state.agent_service
        .list_categories(&app_state.db_pool, caller.organisation_id)
        .await?;

    Ok((StatusCode::OK, Json(categories)))
}

// =============================================================================
//  TAGS
// =============================================================================

// POST /api/tags
#[utoipa::path(
    post,
    path = "/api/tags",
    tag = "Taxonomy",
    request_body = NamePayload,
    responses(
        (status = 201, description = "Tag criada", body = Tag),
        (status = 409, description = "Tag já existe")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_tag(
    State(app_state): State<AppState>,
    AuthenticatedUser(caller): AuthenticatedUser,
    Json(payload): Json<NamePayload>,
) -> Result<impl IntoResponse, AppError> {
    caller.require_organiser()?;
    payload.validate()?;

    let tag = app_state.agent_service
        .create_tag(&app_state.db_pool, &payload.name)
        .await?;

    Ok((StatusCode::CREATED, Json(tag)))
}

// GET /api/tags
#[utoipa::path(
    get,
    path = "/api/tags",
    tag = "Taxonomy",
    responses(
        (status = 200, description = "Tags", body = Vec<Tag>)
    ),
    security(("api_jwt" = []))
)]
pub async fn list_tags(
    State(app_state): State<AppState>,
    AuthenticatedUser(_caller): AuthenticatedUser,
) -> Result<impl IntoResponse, AppError> {
    let tags = app_state.agent_service.list_tags(&app_state.db_pool).await?;

    Ok((StatusCode::OK, Json(tags)))
}
