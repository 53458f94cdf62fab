// src/handlers/reminders.rs

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use chrono::Utc;
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::error::AppError,
    config::AppState,
    middleware::auth::AuthenticatedUser,
    models::schedule::{CreateFollowUpPayload, FollowUp, FollowUpCreated, ReminderNotification},
};

// POST /api/leads/{lead_id}/follow-ups
#[utoipa::path(
    post,
    path = "/api/leads/{lead_id}/follow-ups",
    tag = "Follow-ups",
    request_body = CreateFollowUpPayload,
    params(
        ("lead_id" = Uuid, Path, description = "ID do lead")
    ),
    responses(
        (status = 201, description = "Acompanhamento criado", body = FollowUpCreated),
        (status = 400, description = "Lembrete no passado")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_follow_up(
    State(app_state): State<AppState>,
    AuthenticatedUser(caller): AuthenticatedUser,
    Path(lead_id): Path<Uuid>,
    Json(payload): Json<CreateFollowUpPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let created = app_state.reminder_service
        .create_follow_up(&app_state.db_pool, caller.scope(), caller.user_id, lead_id, &payload)
        .await?;

    Ok((StatusCode::CREATED, Json(created)))
}

// GET /api/leads/{lead_id}/follow-ups
#[utoipa::path(
    get,
    path = "/api/leads/{lead_id}/follow-ups",
    tag = "Follow-ups",
    params(
        ("lead_id" = Uuid, Path, description = "ID do lead")
    ),
    responses(
        (status = 200, description = "Acompanhamentos do lead", body = Vec<FollowUp>)
    ),
    security(("api_jwt" = []))
)]
pub async fn list_follow_ups(
    State(app_state): State<AppState>,
    AuthenticatedUser(caller): AuthenticatedUser,
    Path(lead_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let follow_ups = app_state.reminder_service
        .list_follow_ups(&app_state.db_pool, caller.scope(), lead_id)
        .await?;

    Ok((StatusCode::OK, Json(follow_ups)))
}

// GET /api/reminders (lembretes ainda não disparados do usuário)
#[utoipa::path(
    get,
    path = "/api/reminders",
    tag = "Follow-ups",
    responses(
        (status = 200, description = "Lembretes ainda não disparados", body = Vec<ReminderNotification>)
    ),
    security(("api_jwt" = []))
)]
pub async fn pending_reminders(
    State(app_state): State<AppState>,
    AuthenticatedUser(caller): AuthenticatedUser,
) -> Result<impl IntoResponse, AppError> {
    let reminders = app_state.reminder_service
        .pending_reminders(&app_state.db_pool, caller.user_id)
        .await?;

    Ok((StatusCode::OK, Json(reminders)))
}

// GET /api/reminders/due (caixa de notificações: horário já chegou, disparado ou não)
#[utoipa::path(
    get,
    path = "/api/reminders/due",
    tag = "Follow-ups",
    responses(
        (status = 200, description = "Lembretes vencidos do usuário, mais recentes primeiro", body = Vec<ReminderNotification>)
    ),
    security(("api_jwt" = []))
)]
pub async fn due_reminders(
    State(app_state): State<AppState>,
    AuthenticatedUser(caller): AuthenticatedUser,
) -> Result<impl IntoResponse, AppError> {
    let reminders = app_state.reminder_service
        .due_reminders(&app_state.db_pool, caller.user_id, Utc::now())
        .await?;

    Ok((StatusCode::OK, Json(reminders)))
}
