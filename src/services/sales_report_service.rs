// src/services/sales_report_service.rs

use sqlx::{Acquire, Executor, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{AgentRepository, SalesReportRepository},
    models::sales_report::{CreateSalesReportPayload, SalesReport},
};

#[derive(Clone)]
pub struct SalesReportService {
    reports: SalesReportRepository,
    agents: AgentRepository,
}

impl SalesReportService {
    pub fn new(reports: SalesReportRepository, agents: AgentRepository) -> Self {
        Self { reports, agents }
    }

    /// Avaliação mensal. Uma por agente e mês; não há edição depois.
    pub async fn create<'e, A>(
        &self,
        conn: A,
        organisation_id: Uuid,
        evaluator_id: Uuid,
        payload: &CreateSalesReportPayload,
    ) -> Result<SalesReport, AppError>
    where
        A: Acquire<'e, Database = Postgres>,
    {
        let mut conn = conn.acquire().await?;

        self.agents
            .find_agent(&mut *conn, organisation_id, payload.agent_id)
            .await?
            .ok_or(AppError::NotFound("Agente"))?;

        let report = self
            .reports
            .create(&mut *conn, organisation_id, evaluator_id, payload, payload.total_rate())
            .await?;

        tracing::info!(
            "📝 Avaliação {}/{} registrada para o agente {} ({}%)",
            report.month,
            report.year,
            report.agent_id,
            report.total_rate
        );
        Ok(report)
    }

    pub async fn list<'e, E>(&self, executor: E, organisation_id: Uuid) -> Result<Vec<SalesReport>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        self.reports.list(executor, organisation_id).await
    }

    pub async fn get<'e, E>(
        &self,
        executor: E,
        organisation_id: Uuid,
        report_id: Uuid,
    ) -> Result<SalesReport, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        self.reports
            .find(executor, organisation_id, report_id)
            .await?
            .ok_or(AppError::NotFound("Avaliação"))
    }
}
