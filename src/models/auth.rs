// src/models/auth.rs

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{common::error::AppError, models::lead::LeadScope};

/// Claims do token emitido pelo serviço de identidade.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,  // ID do usuário
    pub org: Uuid,  // Organização
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agent: Option<Uuid>, // Presente quando o usuário é agente
    pub exp: usize,
    pub iat: usize,
}

/// Quem está chamando: organizador (sem agente) ou agente.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Caller {
    pub user_id: Uuid,
    pub organisation_id: Uuid,
    pub agent_id: Option<Uuid>,
}

impl From<Claims> for Caller {
    fn from(c: Claims) -> Self {
        Self { user_id: c.sub, organisation_id: c.org, agent_id: c.agent }
    }
}

impl Caller {
    pub fn is_organiser(&self) -> bool {
        self.agent_id.is_none()
    }

    pub fn scope(&self) -> LeadScope {
        LeadScope { organisation_id: self.organisation_id, agent_id: self.agent_id }
    }

    pub fn require_organiser(&self) -> Result<(), AppError> {
        if self.is_organiser() { Ok(()) } else { Err(AppError::Forbidden) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn agents_are_scoped_and_cannot_act_as_organisers() {
        let agent = Caller {
            user_id: Uuid::from_u128(1),
            organisation_id: Uuid::from_u128(2),
            agent_id: Some(Uuid::from_u128(3)),
        };
        assert_eq!(agent.scope().agent_id, Some(Uuid::from_u128(3)));
        assert!(matches!(agent.require_organiser(), Err(AppError::Forbidden)));

        let organiser = Caller { agent_id: None, ..agent };
        assert_eq!(organiser.scope().agent_id, None);
        assert!(organiser.require_organiser().is_ok());
    }
}
