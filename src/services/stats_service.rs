// src/services/stats_service.rs

use sqlx::{Acquire, Postgres};
use uuid::Uuid;

use crate::{
    common::{dates::DateWindow, error::AppError},
    db::{AgentRepository, StatsRepository},
    models::agent::Agent,
    models::lead::LeadScope,
    models::stats::{AgentStats, DashboardSummary, StatsReport},
};

#[derive(Clone)]
pub struct StatsService {
    stats: StatsRepository,
    agents: AgentRepository,
}

/// Quais agentes entram no relatório. Agente só enxerga a si mesmo.
pub fn resolve_report_agents(scope: LeadScope, requested: &[Uuid]) -> Result<Option<Vec<Uuid>>, AppError> {
    match scope.agent_id {
        Some(own) if requested.iter().all(|id| *id == own) => Ok(Some(vec![own])),
        Some(_) => Err(AppError::Forbidden),
        None if requested.is_empty() => Ok(None),
        None => Ok(Some(requested.to_vec())),
    }
}

impl StatsService {
    pub fn new(stats: StatsRepository, agents: AgentRepository) -> Self {
        Self { stats, agents }
    }

    /// Estatísticas de um agente na janela.
    pub async fn calculate_stats<'e, A>(
        &self,
        conn: A,
        organisation_id: Uuid,
        agent_id: Uuid,
        window: DateWindow,
    ) -> Result<AgentStats, AppError>
    where
        A: Acquire<'e, Database = Postgres>,
    {
        let mut conn = conn.acquire().await?;

        let agent = self
            .agents
            .find_agent(&mut *conn, organisation_id, agent_id)
            .await?
            .ok_or(AppError::NotFound("Agente"))?;

        self.stats_for(&mut *conn, &agent, window).await
    }

    /// Relatório de vários agentes. Nenhum agente pedido => todos da organização.
    pub async fn report<'e, A>(
        &self,
        conn: A,
        scope: LeadScope,
        requested: &[Uuid],
        window: DateWindow,
    ) -> Result<StatsReport, AppError>
    where
        A: Acquire<'e, Database = Postgres>,
    {
        let mut conn = conn.acquire().await?;
        let organisation_id = scope.organisation_id;

        let agents = match resolve_report_agents(scope, requested)? {
            None => self.agents.list_agents(&mut *conn, organisation_id).await?,
            Some(ids) => self.agents.find_agents(&mut *conn, organisation_id, &ids).await?,
        };

        let mut data = Vec::with_capacity(agents.len());
        for agent in &agents {
            data.push(self.stats_for(&mut *conn, agent, window).await?);
        }

        tracing::debug!("Estatísticas calculadas para {} agentes", data.len());
        Ok(StatsReport { window, data })
    }

    pub async fn dashboard<'e, A>(
        &self,
        conn: A,
        organisation_id: Uuid,
        window: DateWindow,
    ) -> Result<DashboardSummary, AppError>
    where
        A: Acquire<'e, Database = Postgres>,
    {
        self.stats.dashboard(conn, organisation_id, window).await
    }

    async fn stats_for(
        &self,
        conn: &mut sqlx::PgConnection,
        agent: &Agent,
        window: DateWindow,
    ) -> Result<AgentStats, AppError> {
        let tally = self.stats.call_tally(&mut *conn, agent.id, window).await?;
        Ok(AgentStats::from_tally(agent.id, agent.display_name(), tally))
    }
}
