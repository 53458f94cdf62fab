// src/models/agent.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;
use utoipa::ToSchema;

// ---
// 1. Agent (usuário que trabalha os leads)
// ---
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Agent {
    pub id: Uuid,
    pub organisation_id: Uuid,
    pub user_id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub created_at: DateTime<Utc>,
}

impl Agent {
    pub fn display_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateAgentPayload {
    pub user_id: Uuid,
    #[validate(length(min = 1, max = 64, message = "required"))]
    pub first_name: String,
    #[validate(length(min = 1, max = 64, message = "required"))]
    pub last_name: String,
}

// ---
// 2. Category (classificação única por lead, escopo da organização)
// ---
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: Uuid,
    pub organisation_id: Uuid,
    pub name: String,
}

pub const CATEGORY_CONVERTED: &str = "Converted";
pub const CATEGORY_NOT_INTERESTED: &str = "Not Interested";

// ---
// 3. Tag (rótulo global, muitos-para-muitos)
// ---
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Tag {
    pub id: Uuid,
    pub name: String,
}

pub const TAG_ANSWERED: &str = "Answered";
pub const TAG_INTERESTED: &str = "Interested";

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct NamePayload {
    #[validate(length(min = 1, max = 32, message = "required"))]
    pub name: String,
}
