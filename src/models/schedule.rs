// src/models/schedule.rs

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;
use utoipa::ToSchema;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FollowUp {
    pub id: Uuid,
    pub lead_id: Uuid,
    pub author_id: Uuid,
    pub notes: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Schedule {
    pub id: Uuid,
    pub lead_id: Uuid,
    pub title: String,
    pub date: NaiveDate,
    pub time: NaiveTime,
}

/// Dispara uma única vez em `reminder_on`; depois fica `sent = true` para sempre.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReminderNotification {
    pub id: Uuid,
    pub user_id: Uuid,
    pub lead_id: Uuid,
    pub message: String,
    pub reminder_on: DateTime<Utc>,
    pub sent: bool,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReminderPayload {
    #[validate(length(min = 1, max = 30, message = "required"))]
    pub title: String,
    pub date: NaiveDate,
    pub time: NaiveTime,
}

impl ReminderPayload {
    pub fn reminder_on(&self) -> DateTime<Utc> {
        self.date.and_time(self.time).and_utc()
    }
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateFollowUpPayload {
    #[serde(default)]
    pub notes: String,
    #[validate(nested)]
    pub reminder: Option<ReminderPayload>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FollowUpCreated {
    pub follow_up: FollowUp,
    pub schedule: Option<Schedule>,
    pub reminder: Option<ReminderNotification>,
}

/// O que é publicado para quem entrega a notificação ao usuário.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReminderEvent {
    pub reminder_id: Uuid,
    pub user_id: Uuid,
    pub lead_id: Uuid,
    pub message: String,
}

impl From<ReminderNotification> for ReminderEvent {
    fn from(r: ReminderNotification) -> Self {
        Self {
            reminder_id: r.id,
            user_id: r.user_id,
            lead_id: r.lead_id,
            message: r.message,
        }
    }
}
