// src/services/assignment_service.rs

use std::collections::HashSet;

use sqlx::{Acquire, Executor, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{AgentRepository, LeadRepository},
    models::lead::{ImportRow, ImportSummary, LeadRow, LeadScope, LogCallPayload, ReassignSummary},
};

// =============================================================================
//  PARTIÇÃO E DEDUPLICAÇÃO (funções puras)
// =============================================================================

/// Divide `items` em `k` fatias contíguas e na ordem original.
/// As `N % k` primeiras fatias levam um item a mais.
pub fn partition<T>(items: &[T], k: usize) -> Result<Vec<&[T]>, AppError> {
    if k == 0 {
        return Err(AppError::invalid("não é possível dividir leads entre zero agentes"));
    }

    let (q, r) = (items.len() / k, items.len() % k);
    let mut groups = Vec::with_capacity(k);
    let mut start = 0;

    for i in 0..k {
        let size = if i < r { q + 1 } else { q };
        groups.push(&items[start..start + size]);
        start += size;
    }

    Ok(groups)
}

/// Remove telefones repetidos no lote (fica o primeiro) e os que já existem na organização.
pub fn dedup_batch(batch: Vec<ImportRow>, existing: &HashSet<String>) -> Vec<ImportRow> {
    let mut seen = HashSet::with_capacity(batch.len());

    batch
        .into_iter()
        .filter(|row| !existing.contains(&row.phone_number))
        .filter(|row| seen.insert(row.phone_number.clone()))
        .collect()
}

/// Quem recebe qual fatia do lote. `None` deixa a fatia sem agente.
#[derive(Debug)]
pub struct AssignmentPlan<'a, T> {
    pub groups: Vec<(Option<Uuid>, &'a [T])>,
}

impl<'a, T> AssignmentPlan<'a, T> {
    pub fn unassigned(items: &'a [T]) -> Self {
        Self { groups: vec![(None, items)] }
    }

    pub fn to_agent(agent_id: Uuid, items: &'a [T]) -> Self {
        Self { groups: vec![(Some(agent_id), items)] }
    }

    /// O agente `i` (na ordem recebida) fica com a fatia `i` da partição.
    pub fn spread(items: &'a [T], agent_ids: &[Uuid]) -> Result<Self, AppError> {
        let slices = partition(items, agent_ids.len())?;
        let groups = agent_ids
            .iter()
            .copied()
            .map(Some)
            .zip(slices)
            .collect();

        Ok(Self { groups })
    }
}

// =============================================================================
//  SERVIÇO
// =============================================================================

#[derive(Clone)]
pub struct AssignmentService {
    leads: LeadRepository,
    agents: AgentRepository,
}

enum ImportTarget {
    Unassigned,
    Agent(Uuid),
    AllAgents,
}

impl AssignmentService {
    pub fn new(leads: LeadRepository, agents: AgentRepository) -> Self {
        Self { leads, agents }
    }

    pub async fn assign_unassigned<'e, A>(
        &self,
        conn: A,
        organisation_id: Uuid,
        batch: Vec<ImportRow>,
    ) -> Result<ImportSummary, AppError>
    where
        A: Acquire<'e, Database = Postgres>,
    {
        self.import(conn, organisation_id, batch, ImportTarget::Unassigned).await
    }

    pub async fn assign_to_agent<'e, A>(
        &self,
        conn: A,
        organisation_id: Uuid,
        agent_id: Uuid,
        batch: Vec<ImportRow>,
    ) -> Result<ImportSummary, AppError>
    where
        A: Acquire<'e, Database = Postgres>,
    {
        self.import(conn, organisation_id, batch, ImportTarget::Agent(agent_id)).await
    }

    pub async fn assign_randomly<'e, A>(
        &self,
        conn: A,
        organisation_id: Uuid,
        batch: Vec<ImportRow>,
    ) -> Result<ImportSummary, AppError>
    where
        A: Acquire<'e, Database = Postgres>,
    {
        self.import(conn, organisation_id, batch, ImportTarget::AllAgents).await
    }

    async fn import<'e, A>(
        &self,
        conn: A,
        organisation_id: Uuid,
        batch: Vec<ImportRow>,
        target: ImportTarget,
    ) -> Result<ImportSummary, AppError>
    where
        A: Acquire<'e, Database = Postgres>,
    {
        let received = batch.len();
        let mut tx = conn.begin().await?;

        let phones: Vec<String> = batch.iter().map(|row| row.phone_number.clone()).collect();
        let existing = self.leads.existing_phone_numbers(&mut *tx, organisation_id, &phones).await?;
        let fresh = dedup_batch(batch, &existing);

        let plan = match target {
            ImportTarget::Unassigned => AssignmentPlan::unassigned(&fresh),
            ImportTarget::Agent(agent_id) => {
                self.agents
                    .find_agent(&mut *tx, organisation_id, agent_id)
                    .await?
                    .ok_or(AppError::NotFound("Agente"))?;
                AssignmentPlan::to_agent(agent_id, &fresh)
            }
            ImportTarget::AllAgents => {
                let agent_ids: Vec<Uuid> = self
                    .agents
                    .list_agents(&mut *tx, organisation_id)
                    .await?
                    .iter()
                    .map(|a| a.id)
                    .collect();
                if agent_ids.is_empty() {
                    return Err(AppError::invalid("a organização não possui agentes"));
                }
                AssignmentPlan::spread(&fresh, &agent_ids)?
            }
        };

        let mut inserted = 0;
        for (agent_id, rows) in plan.groups {
            inserted += self.leads.insert_leads(&mut tx, organisation_id, agent_id, rows).await?;
        }

        tx.commit().await?;

        let summary = ImportSummary {
            received,
            inserted,
            skipped: received as u64 - inserted,
        };

        if summary.skipped > 0 {
            tracing::warn!("⚠️ {} leads duplicados ignorados na importação", summary.skipped);
        }
        tracing::info!("📥 Importação concluída: {} de {} leads inseridos", inserted, received);

        Ok(summary)
    }

    /// Redistribui leads existentes entre os agentes escolhidos (ou todos, quando nenhum foi escolhido).
    /// Ids de outra organização são ignorados.
    pub async fn reassign_selected<'e, A>(
        &self,
        conn: A,
        organisation_id: Uuid,
        lead_ids: &[Uuid],
        agent_ids: &[Uuid],
    ) -> Result<ReassignSummary, AppError>
    where
        A: Acquire<'e, Database = Postgres>,
    {
        let mut tx = conn.begin().await?;

        let agents = if agent_ids.is_empty() {
            self.agents.list_agents(&mut *tx, organisation_id).await?
        } else {
            self.agents.find_agents(&mut *tx, organisation_id, agent_ids).await?
        };

        if agents.is_empty() {
            return Err(AppError::invalid("nenhum agente disponível para a redistribuição"));
        }

        let mut seen = HashSet::with_capacity(lead_ids.len());
        let unique: Vec<Uuid> = lead_ids.iter().copied().filter(|id| seen.insert(*id)).collect();

        let targets: Vec<Uuid> = agents.iter().map(|a| a.id).collect();
        let plan = AssignmentPlan::spread(&unique, &targets)?;

        let mut updated = 0;
        for (agent_id, ids) in plan.groups {
            if let Some(agent_id) = agent_id {
                updated += self.leads.assign_agent(&mut *tx, organisation_id, agent_id, ids).await?;
            }
        }

        tx.commit().await?;

        tracing::info!("🔀 {} leads redistribuídos entre {} agentes", updated, targets.len());
        Ok(ReassignSummary { updated })
    }

    pub async fn delete_selected<'e, E>(
        &self,
        executor: E,
        organisation_id: Uuid,
        lead_ids: &[Uuid],
    ) -> Result<u64, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        if lead_ids.is_empty() {
            return Ok(0);
        }

        let deleted = self.leads.delete_selected(executor, organisation_id, lead_ids).await?;
        tracing::info!("🗑️ {} leads removidos", deleted);

        Ok(deleted)
    }

    // =========================================================================
    //  RESULTADO DE LIGAÇÃO
    // =========================================================================

    pub async fn log_call<'e, A>(
        &self,
        conn: A,
        scope: LeadScope,
        lead_id: Uuid,
        payload: &LogCallPayload,
    ) -> Result<LeadRow, AppError>
    where
        A: Acquire<'e, Database = Postgres>,
    {
        let mut tx = conn.begin().await?;

        // Agente só registra ligação nos próprios leads
        self.leads
            .find_in_scope(&mut *tx, scope, lead_id)
            .await?
            .ok_or(AppError::NotFound("Lead"))?;

        if let Some(category_id) = payload.category_id {
            if !self.agents.category_exists(&mut *tx, scope.organisation_id, category_id).await? {
                return Err(AppError::NotFound("Categoria"));
            }
        }

        self.leads
            .record_call(&mut tx, scope.organisation_id, lead_id, payload.category_id, &payload.tag_ids)
            .await?;

        let lead = self
            .leads
            .find_in_scope(&mut *tx, scope, lead_id)
            .await?
            .ok_or(AppError::NotFound("Lead"))?;

        tx.commit().await?;

        tracing::info!("📞 Ligação registrada para o lead {}", lead_id);
        Ok(lead)
    }
}
