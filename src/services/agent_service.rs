// src/services/agent_service.rs

use sqlx::{Executor, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::AgentRepository,
    models::agent::{Agent, Category, CreateAgentPayload, Tag},
};

/// Agentes, categorias e tags.
#[derive(Clone)]
pub struct AgentService {
    repo: AgentRepository,
}

impl AgentService {
    pub fn new(repo: AgentRepository) -> Self {
        Self { repo }
    }

    // =========================================================================
    //  AGENTES
    // =========================================================================

    pub async fn create_agent<'e, E>(
        &self,
        executor: E,
        organisation_id: Uuid,
        payload: &CreateAgentPayload,
    ) -> Result<Agent, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let agent = self
            .repo
            .create_agent(
                executor,
                organisation_id,
                payload.user_id,
                payload.first_name.trim(),
                payload.last_name.trim(),
            )
            .await?;

        tracing::info!("👤 Agente {} criado", agent.display_name());
        Ok(agent)
    }

    pub async fn list_agents<'e, E>(&self, executor: E, organisation_id: Uuid) -> Result<Vec<Agent>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        self.repo.list_agents(executor, organisation_id).await
    }

    /// Os leads do agente voltam a ficar sem dono.
    pub async fn delete_agent<'e, E>(
        &self,
        executor: E,
        organisation_id: Uuid,
        agent_id: Uuid,
    ) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        if !self.repo.delete_agent(executor, organisation_id, agent_id).await? {
            return Err(AppError::NotFound("Agente"));
        }
        tracing::info!("🗑️ Agente {} removido", agent_id);
        Ok(())
    }

    // =========================================================================
    //  CATEGORIAS E TAGS
    // =========================================================================

    pub async fn create_category<'e, E>(
        &self,
        executor: E,
        organisation_id: Uuid,
        name: &str,
    ) -> Result<Category, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        self.repo.create_category(executor, organisation_id, name.trim()).await
    }

    pub async fn list_categories<'e, E>(
        &self,
        executor: E,
        organisation_id: Uuid,
    ) -> Result<Vec<Category>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        self.repo.list_categories(executor, organisation_id).await
    }

    pub async fn create_tag<'e, E>(&self, executor: E, name: &str) -> Result<Tag, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        self.repo.create_tag(executor, name.trim()).await
    }

    pub async fn list_tags<'e, E>(&self, executor: E) -> Result<Vec<Tag>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        self.repo.list_tags(executor).await
    }
}
