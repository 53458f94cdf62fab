// src/db/agent_repo.rs

use sqlx::{Executor, Postgres};
use uuid::Uuid;

use crate::{
    common::error::{map_unique_violation, AppError},
    models::agent::{Agent, Category, Tag},
};

#[derive(Clone, Default)]
pub struct AgentRepository;

impl AgentRepository {
    pub fn new() -> Self {
        Self
    }

    // =========================================================================
    //  AGENTES
    // =========================================================================

    pub async fn create_agent<'e, E>(
        &self,
        executor: E,
        organisation_id: Uuid,
        user_id: Uuid,
        first_name: &str,
        last_name: &str,
    ) -> Result<Agent, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, Agent>(
            r#"
            INSERT INTO agents (organisation_id, user_id, first_name, last_name)
            VALUES ($1, $2, $3, $4)
            RETURNING id, organisation_id, user_id, first_name, last_name, created_at
            "#,
        )
            .bind(organisation_id)
            .bind(user_id)
            .bind(first_name)
            .bind(last_name)
            .fetch_one(executor)
            .await
            .map_err(|e| map_unique_violation(e, || "Este usuário já é um agente.".to_string()))
    }

    /// Agentes da organização na ordem de cadastro (ordem estável para a partição)
    pub async fn list_agents<'e, E>(
        &self,
        executor: E,
        organisation_id: Uuid,
    ) -> Result<Vec<Agent>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let agents = sqlx::query_as::<_, Agent>(
            r#"
            SELECT id, organisation_id, user_id, first_name, last_name, created_at
            FROM agents
            WHERE organisation_id = $1
            ORDER BY created_at ASC, id ASC
            "#,
        )
            .bind(organisation_id)
            .fetch_all(executor)
            .await?;

        Ok(agents)
    }

    /// Só os agentes pedidos que pertencem à organização, na ordem de cadastro
    pub async fn find_agents<'e, E>(
        &self,
        executor: E,
        organisation_id: Uuid,
        agent_ids: &[Uuid],
    ) -> Result<Vec<Agent>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let agents = sqlx::query_as::<_, Agent>(
            r#"
            SELECT id, organisation_id, user_id, first_name, last_name, created_at
            FROM agents
            WHERE organisation_id = $1 AND id = ANY($2)
            ORDER BY created_at ASC, id ASC
            "#,
        )
            .bind(organisation_id)
            .bind(agent_ids)
            .fetch_all(executor)
            .await?;

        Ok(agents)
    }

    pub async fn find_agent<'e, E>(
        &self,
        executor: E,
        organisation_id: Uuid,
        agent_id: Uuid,
    ) -> Result<Option<Agent>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let agent = sqlx::query_as::<_, Agent>(
            r#"
            SELECT id, organisation_id, user_id, first_name, last_name, created_at
            FROM agents
            WHERE organisation_id = $1 AND id = $2
            "#,
        )
            .bind(organisation_id)
            .bind(agent_id)
            .fetch_optional(executor)
            .await?;

        Ok(agent)
    }

    /// Os leads do agente ficam sem dono (ON DELETE SET NULL)
    pub async fn delete_agent<'e, E>(
        &self,
        executor: E,
        organisation_id: Uuid,
        agent_id: Uuid,
    ) -> Result<bool, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query("DELETE FROM agents WHERE organisation_id = $1 AND id = $2")
            .bind(organisation_id)
            .bind(agent_id)
            .execute(executor)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    // =========================================================================
    //  CATEGORIAS
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
        sqlx::query_as::<_, Category>(
            "INSERT INTO categories (organisation_id, name) VALUES ($1, $2) RETURNING id, organisation_id, name",
        )
            .bind(organisation_id)
            .bind(name)
            .fetch_one(executor)
            .await
            .map_err(|e| map_unique_violation(e, || format!("A categoria '{}' já existe.", name)))
    }

    pub async fn list_categories<'e, E>(
        &self,
        executor: E,
        organisation_id: Uuid,
    ) -> Result<Vec<Category>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let categories = sqlx::query_as::<_, Category>(
            "SELECT id, organisation_id, name FROM categories WHERE organisation_id = $1 ORDER BY name ASC",
        )
            .bind(organisation_id)
            .fetch_all(executor)
            .await?;

        Ok(categories)
    }

    pub async fn category_exists<'e, E>(
        &self,
        executor: E,
        organisation_id: Uuid,
        category_id: Uuid,
    ) -> Result<bool, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT 1 FROM categories WHERE organisation_id = $1 AND id = $2)",
        )
            .bind(organisation_id)
            .bind(category_id)
            .fetch_one(executor)
            .await?;

        Ok(exists)
    }

    // =========================================================================
    //  TAGS (globais)
    // =========================================================================

    pub async fn create_tag<'e, E>(&self, executor: E, name: &str) -> Result<Tag, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, Tag>("INSERT INTO tags (name) VALUES ($1) RETURNING id, name")
            .bind(name)
            .fetch_one(executor)
            .await
            .map_err(|e| map_unique_violation(e, || format!("A tag '{}' já existe.", name)))
    }

    pub async fn list_tags<'e, E>(&self, executor: E) -> Result<Vec<Tag>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let tags = sqlx::query_as::<_, Tag>("SELECT id, name FROM tags ORDER BY name ASC")
            .fetch_all(executor)
            .await?;

        Ok(tags)
    }
}
