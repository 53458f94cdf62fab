// src/middleware/auth.rs

use axum::{
    extract::{FromRequestParts, Request, State},
    http::request::Parts,
    middleware::Next,
    response::Response,
};
use jsonwebtoken::{decode, DecodingKey, Validation};

use crate::{
    common::error::AppError,
    config::AppState,
    models::auth::{Caller, Claims},
};

/// Valida o bearer token e devolve quem está chamando.
pub fn decode_caller(token: &str, secret: &str) -> Result<Caller, AppError> {
    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_ref()),
        &Validation::default(),
    )
    .map_err(|_| AppError::InvalidToken)?;

    Ok(Caller::from(token_data.claims))
}

// O middleware em si
pub async fn auth_guard(
    State(app_state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = request
        .headers()
        .get("Authorization")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .ok_or(AppError::InvalidToken)?;

    let caller = decode_caller(token, &app_state.jwt_secret)?;

    // Insere o chamador nos "extensions" da requisição
    request.extensions_mut().insert(caller);
    Ok(next.run(request).await)
}

// Extrator para obter o chamador autenticado diretamente nos handlers
pub struct AuthenticatedUser(pub Caller);

impl<S> FromRequestParts<S> for AuthenticatedUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Caller>()
            .copied()
            .map(AuthenticatedUser)
            .ok_or(AppError::InvalidToken)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{encode, EncodingKey, Header};
    use uuid::Uuid;

    fn token(claims: &Claims, secret: &str) -> String {
        encode(&Header::default(), claims, &EncodingKey::from_secret(secret.as_ref())).unwrap()
    }

    fn claims(agent: Option<Uuid>) -> Claims {
        let now = chrono::Utc::now().timestamp() as usize;
        Claims {
            sub: Uuid::from_u128(10),
            org: Uuid::from_u128(20),
            agent,
            exp: now + 3600,
            iat: now,
        }
    }

    #[test]
    fn decodes_agent_caller() {
        let caller = decode_caller(&token(&claims(Some(Uuid::from_u128(30))), "segredo"), "segredo").unwrap();

        assert_eq!(caller.user_id, Uuid::from_u128(10));
        assert_eq!(caller.organisation_id, Uuid::from_u128(20));
        assert_eq!(caller.agent_id, Some(Uuid::from_u128(30)));
        assert!(!caller.is_organiser());
    }

    #[test]
    fn token_without_agent_is_an_organiser() {
        let caller = decode_caller(&token(&claims(None), "segredo"), "segredo").unwrap();
        assert!(caller.is_organiser());
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let err = decode_caller(&token(&claims(None), "segredo"), "outro").unwrap_err();
        assert!(matches!(err, AppError::InvalidToken));
    }

    #[test]
    fn expired_token_is_rejected() {
        let mut c = claims(None);
        c.exp = 1_000;
        c.iat = 900;
        assert!(matches!(decode_caller(&token(&c, "segredo"), "segredo"), Err(AppError::InvalidToken)));
    }
}
