// src/db/sales_report_repo.rs

use sqlx::{Executor, Postgres};
use uuid::Uuid;

use crate::{
    common::error::{map_unique_violation, AppError},
    models::sales_report::{CreateSalesReportPayload, SalesReport},
};

const REPORT_COLUMNS: &str = "id, organisation_id, agent_id, evaluator_id, year, month, \
    performance, kpi_rate, revenue, best_service, customer_support, total_rate, created_at";

#[derive(Clone, Default)]
pub struct SalesReportRepository;

impl SalesReportRepository {
    pub fn new() -> Self {
        Self
    }

    pub async fn create<'e, E>(
        &self,
        executor: E,
        organisation_id: Uuid,
        evaluator_id: Uuid,
        report: &CreateSalesReportPayload,
        total_rate: i32,
    ) -> Result<SalesReport, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!(
            r#"
            INSERT INTO sales_reports (
                organisation_id, agent_id, evaluator_id, year, month,
                performance, kpi_rate, revenue, best_service, customer_support, total_rate
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            RETURNING {REPORT_COLUMNS}
            "#
        );

        sqlx::query_as::<_, SalesReport>(&sql)
            .bind(organisation_id)
            .bind(report.agent_id)
            .bind(evaluator_id)
            .bind(report.year)
            .bind(report.month)
            .bind(report.performance)
            .bind(report.kpi_rate)
            .bind(report.revenue)
            .bind(report.best_service)
            .bind(report.customer_support)
            .bind(total_rate)
            .fetch_one(executor)
            .await
            .map_err(|e| {
                map_unique_violation(e, || {
                    format!("Já existe avaliação para {}/{} deste agente.", report.month, report.year)
                })
            })
    }

    pub async fn list<'e, E>(&self, executor: E, organisation_id: Uuid) -> Result<Vec<SalesReport>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!(
            "SELECT {REPORT_COLUMNS} FROM sales_reports WHERE organisation_id = $1 \
             ORDER BY year DESC, month DESC, created_at DESC"
        );

        let reports = sqlx::query_as::<_, SalesReport>(&sql)
            .bind(organisation_id)
            .fetch_all(executor)
            .await?;

        Ok(reports)
    }

    pub async fn find<'e, E>(
        &self,
        executor: E,
        organisation_id: Uuid,
        report_id: Uuid,
    ) -> Result<Option<SalesReport>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!("SELECT {REPORT_COLUMNS} FROM sales_reports WHERE organisation_id = $1 AND id = $2");

        let report = sqlx::query_as::<_, SalesReport>(&sql)
            .bind(organisation_id)
            .bind(report_id)
            .fetch_optional(executor)
            .await?;

        Ok(report)
    }
}
