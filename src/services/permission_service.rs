// src/services/permission_service.rs

use std::collections::HashSet;

use sqlx::{Acquire, Executor, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{AgentRepository, PermissionRepository},
    models::permission::{Permission, PermissionPayload},
};

/// Códigos pedidos sem repetição, na ordem recebida.
pub fn unique_codes(codes: &[String]) -> Vec<String> {
    let mut seen = HashSet::with_capacity(codes.len());
    codes
        .iter()
        .map(|c| c.trim().to_string())
        .filter(|c| !c.is_empty() && seen.insert(c.clone()))
        .collect()
}

/// Códigos pedidos que não existem no catálogo.
pub fn unknown_codes<'a>(requested: &'a [String], found: &[Permission]) -> Vec<&'a str> {
    let known: HashSet<&str> = found.iter().map(|p| p.code.as_str()).collect();
    requested
        .iter()
        .map(String::as_str)
        .filter(|c| !known.contains(c))
        .collect()
}

#[derive(Clone)]
pub struct PermissionService {
    permissions: PermissionRepository,
    agents: AgentRepository,
}

impl PermissionService {
    pub fn new(permissions: PermissionRepository, agents: AgentRepository) -> Self {
        Self { permissions, agents }
    }

    // =========================================================================
    //  CATÁLOGO
    // =========================================================================

    pub async fn create<'e, E>(&self, executor: E, payload: &PermissionPayload) -> Result<Permission, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let permission = self
            .permissions
            .create(executor, payload.name.trim(), payload.code.trim())
            .await?;

        tracing::info!("🔑 Permissão '{}' criada", permission.code);
        Ok(permission)
    }

    pub async fn list<'e, E>(&self, executor: E) -> Result<Vec<Permission>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        self.permissions.list(executor).await
    }

    pub async fn update<'e, E>(
        &self,
        executor: E,
        permission_id: Uuid,
        payload: &PermissionPayload,
    ) -> Result<Permission, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        self.permissions
            .update(executor, permission_id, payload.name.trim(), payload.code.trim())
            .await?
            .ok_or(AppError::NotFound("Permissão"))
    }

    pub async fn delete<'e, E>(&self, executor: E, permission_id: Uuid) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        if !self.permissions.delete(executor, permission_id).await? {
            return Err(AppError::NotFound("Permissão"));
        }
        tracing::info!("🗑️ Permissão {} removida", permission_id);
        Ok(())
    }

    // =========================================================================
    //  CONCESSÕES
    // =========================================================================

    pub async fn agent_grants<'e, A>(
        &self,
        conn: A,
        organisation_id: Uuid,
        agent_id: Uuid,
    ) -> Result<Vec<Permission>, AppError>
    where
        A: Acquire<'e, Database = Postgres>,
    {
        let mut conn = conn.acquire().await?;

        self.agents
            .find_agent(&mut *conn, organisation_id, agent_id)
            .await?
            .ok_or(AppError::NotFound("Agente"))?;

        self.permissions.granted_to(&mut *conn, agent_id).await
    }

    /// Troca o conjunto de permissões do agente pelo informado. Código desconhecido aborta tudo.
    pub async fn replace_grants<'e, A>(
        &self,
        conn: A,
        organisation_id: Uuid,
        agent_id: Uuid,
        codes: &[String],
    ) -> Result<Vec<Permission>, AppError>
    where
        A: Acquire<'e, Database = Postgres>,
    {
        let codes = unique_codes(codes);
        let mut tx = conn.begin().await?;

        self.agents
            .find_agent(&mut *tx, organisation_id, agent_id)
            .await?
            .ok_or(AppError::NotFound("Agente"))?;

        let found = self.permissions.find_by_codes(&mut *tx, &codes).await?;
        let unknown = unknown_codes(&codes, &found);
        if !unknown.is_empty() {
            return Err(AppError::invalid(format!("permissões desconhecidas: {}", unknown.join(", "))));
        }

        let ids: Vec<Uuid> = found.iter().map(|p| p.id).collect();
        self.permissions.replace_grants(&mut tx, agent_id, &ids).await?;

        tx.commit().await?;

        tracing::info!("🔑 Agente {} agora tem {} permissões", agent_id, found.len());
        Ok(found)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use sqlx::PgPool;

    use crate::test_support as ts;

    fn permission(code: &str) -> Permission {
        Permission { id: Uuid::new_v4(), name: code.to_uppercase(), code: code.to_string() }
    }

    #[test]
    fn requested_codes_are_trimmed_and_deduplicated() {
        let codes = vec![" export ".to_string(), "stats".into(), "export".into(), "".into()];
        assert_eq!(unique_codes(&codes), vec!["export".to_string(), "stats".to_string()]);
    }

    #[test]
    fn unknown_codes_are_reported_in_request_order() {
        let requested = vec!["export".to_string(), "delete-leads".into(), "stats".into()];
        let found = vec![permission("stats"), permission("export")];

        assert_eq!(unknown_codes(&requested, &found), vec!["delete-leads"]);
        assert!(unknown_codes(&requested[..1], &found).is_empty());
    }

    // =========================================================================
    //  CONTRA O BANCO
    // =========================================================================

    fn service() -> PermissionService {
        PermissionService::new(PermissionRepository::new(), AgentRepository::new())
    }

    async fn catalogue(pool: &PgPool, codes: &[&str]) {
        for code in codes {
            let payload = PermissionPayload { name: code.to_uppercase(), code: code.to_string() };
            service().create(pool, &payload).await.unwrap();
        }
    }

    fn codes(permissions: &[Permission]) -> Vec<&str> {
        permissions.iter().map(|p| p.code.as_str()).collect()
    }

    fn request(codes: &[&str]) -> Vec<String> {
        codes.iter().map(|c| c.to_string()).collect()
    }

    #[sqlx::test]
    async fn grants_are_replaced_as_a_whole(pool: PgPool) {
        let org = ts::organisation(&pool).await;
        let ana = ts::agent(&pool, org, "Ana").await;
        catalogue(&pool, &["export", "stats", "upload"]).await;

        let granted = service()
            .replace_grants(&pool, org, ana.id, &request(&["stats", "export", "stats"]))
            .await
            .unwrap();
        assert_eq!(codes(&granted), vec!["export", "stats"]);

        service().replace_grants(&pool, org, ana.id, &request(&["upload"])).await.unwrap();
        let current = service().agent_grants(&pool, org, ana.id).await.unwrap();
        assert_eq!(codes(&current), vec!["upload"]);

        service().replace_grants(&pool, org, ana.id, &[]).await.unwrap();
        assert!(service().agent_grants(&pool, org, ana.id).await.unwrap().is_empty());
    }

    #[sqlx::test]
    async fn unknown_code_leaves_previous_grants_untouched(pool: PgPool) {
        let org = ts::organisation(&pool).await;
        let ana = ts::agent(&pool, org, "Ana").await;
        catalogue(&pool, &["export", "stats"]).await;
        service().replace_grants(&pool, org, ana.id, &request(&["export"])).await.unwrap();

        let err = service()
            .replace_grants(&pool, org, ana.id, &request(&["stats", "delete-leads"]))
            .await
            .unwrap_err();

        match err {
            AppError::InvalidArgument(msg) => assert!(msg.contains("delete-leads")),
            other => panic!("erro inesperado: {:?}", other),
        }
        let current = service().agent_grants(&pool, org, ana.id).await.unwrap();
        assert_eq!(codes(&current), vec!["export"]);
    }

    #[sqlx::test]
    async fn agent_from_another_organisation_is_not_found(pool: PgPool) {
        let org = ts::organisation(&pool).await;
        let elsewhere = ts::organisation(&pool).await;
        let stranger = ts::agent(&pool, elsewhere, "Carla").await;
        catalogue(&pool, &["export"]).await;

        let err = service()
            .replace_grants(&pool, org, stranger.id, &request(&["export"]))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));

        let err = service().agent_grants(&pool, org, stranger.id).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[sqlx::test]
    async fn deleting_a_permission_revokes_it(pool: PgPool) {
        let org = ts::organisation(&pool).await;
        let ana = ts::agent(&pool, org, "Ana").await;
        catalogue(&pool, &["export", "stats"]).await;
        let granted = service()
            .replace_grants(&pool, org, ana.id, &request(&["export", "stats"]))
            .await
            .unwrap();

        service().delete(&pool, granted[0].id).await.unwrap();

        let current = service().agent_grants(&pool, org, ana.id).await.unwrap();
        assert_eq!(codes(&current), vec!["stats"]);
        assert!(matches!(service().delete(&pool, granted[0].id).await, Err(AppError::NotFound(_))));
    }

    #[sqlx::test]
    async fn duplicate_code_is_a_conflict(pool: PgPool) {
        catalogue(&pool, &["export"]).await;

        let payload = PermissionPayload { name: "Outra".to_string(), code: "export".to_string() };
        let err = service().create(&pool, &payload).await.unwrap_err();

        assert!(matches!(err, AppError::Conflict(_)));
    }
}
