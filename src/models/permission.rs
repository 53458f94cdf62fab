// src/models/permission.rs

use std::borrow::Cow;

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use utoipa::ToSchema;
use validator::{Validate, ValidationError};

// ---
// Permissão (catálogo global; o organizador concede aos agentes)
// ---
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Permission {
    pub id: Uuid,
    pub name: String,
    pub code: String,
}

/// Código no formato slug: minúsculas, dígitos, `-` e `_`.
pub fn validate_slug(code: &str) -> Result<(), ValidationError> {
    let valid = code
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-' || c == '_');

    if !valid {
        let mut err = ValidationError::new("slug");
        err.message = Some(Cow::from("Use apenas letras minúsculas, números, '-' e '_'."));
        return Err(err);
    }
    Ok(())
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PermissionPayload {
    #[validate(length(min = 1, max = 30, message = "required"))]
    pub name: String,
    #[validate(length(min = 1, max = 30, message = "required"), custom(function = "validate_slug"))]
    pub code: String,
}

/// Substitui o conjunto inteiro de permissões do agente. Lista vazia revoga tudo.
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GrantPermissionsPayload {
    #[serde(default)]
    #[validate(length(max = 100, message = "too_many_permissions"))]
    pub codes: Vec<String>,
}
