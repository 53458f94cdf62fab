// src/db/permission_repo.rs

use sqlx::{Executor, PgConnection, Postgres};
use uuid::Uuid;

use crate::{
    common::error::{map_unique_violation, AppError},
    models::permission::Permission,
};

#[derive(Clone, Default)]
pub struct PermissionRepository;

impl PermissionRepository {
    pub fn new() -> Self {
        Self
    }

    // =========================================================================
    //  CATÁLOGO
    // =========================================================================

    pub async fn create<'e, E>(&self, executor: E, name: &str, code: &str) -> Result<Permission, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, Permission>(
            "INSERT INTO permissions (name, code) VALUES ($1, $2) RETURNING id, name, code",
        )
            .bind(name)
            .bind(code)
            .fetch_one(executor)
            .await
            .map_err(|e| map_unique_violation(e, || format!("A permissão '{}' já existe.", code)))
    }

    pub async fn list<'e, E>(&self, executor: E) -> Result<Vec<Permission>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let permissions = sqlx::query_as::<_, Permission>("SELECT id, name, code FROM permissions ORDER BY name ASC")
            .fetch_all(executor)
            .await?;

        Ok(permissions)
    }

    pub async fn update<'e, E>(
        &self,
        executor: E,
        permission_id: Uuid,
        name: &str,
        code: &str,
    ) -> Result<Option<Permission>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, Permission>(
            "UPDATE permissions SET name = $2, code = $3 WHERE id = $1 RETURNING id, name, code",
        )
            .bind(permission_id)
            .bind(name)
            .bind(code)
            .fetch_optional(executor)
            .await
            .map_err(|e| map_unique_violation(e, || format!("A permissão '{}' já existe.", code)))
    }

    /// Some também das concessões dos agentes (ON DELETE CASCADE)
    pub async fn delete<'e, E>(&self, executor: E, permission_id: Uuid) -> Result<bool, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query("DELETE FROM permissions WHERE id = $1")
            .bind(permission_id)
            .execute(executor)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn find_by_codes<'e, E>(&self, executor: E, codes: &[String]) -> Result<Vec<Permission>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        if codes.is_empty() {
            return Ok(Vec::new());
        }

        let permissions = sqlx::query_as::<_, Permission>(
            "SELECT id, name, code FROM permissions WHERE code = ANY($1) ORDER BY name ASC",
        )
            .bind(codes)
            .fetch_all(executor)
            .await?;

        Ok(permissions)
    }

    // =========================================================================
    //  CONCESSÕES POR AGENTE
    // =========================================================================

    pub async fn granted_to<'e, E>(&self, executor: E, agent_id: Uuid) -> Result<Vec<Permission>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let permissions = sqlx::query_as::<_, Permission>(
            r#"
            SELECT p.id, p.name, p.code
            FROM agent_permissions ap
            JOIN permissions p ON p.id = ap.permission_id
            WHERE ap.agent_id = $1
            ORDER BY p.name ASC
            "#,
        )
            .bind(agent_id)
            .fetch_all(executor)
            .await?;

        Ok(permissions)
    }

    /// Apaga as concessões atuais e grava as novas. Roda dentro da transação de quem chama.
    pub async fn replace_grants(
        &self,
        conn: &mut PgConnection,
        agent_id: Uuid,
        permission_ids: &[Uuid],
    ) -> Result<(), AppError> {
        sqlx::query("DELETE FROM agent_permissions WHERE agent_id = $1")
            .bind(agent_id)
            .execute(&mut *conn)
            .await?;

        if !permission_ids.is_empty() {
            sqlx::query(
                r#"
                INSERT INTO agent_permissions (agent_id, permission_id)
                SELECT $1, UNNEST($2::uuid[])
                ON CONFLICT DO NOTHING
                "#,
            )
                .bind(agent_id)
                .bind(permission_ids)
                .execute(&mut *conn)
                .await?;
        }

        Ok(())
    }
}
