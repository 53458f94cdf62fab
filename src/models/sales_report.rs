// src/models/sales_report.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;
use utoipa::ToSchema;

/// Avaliação mensal de um agente. Imutável depois de criada.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SalesReport {
    pub id: Uuid,
    pub organisation_id: Uuid,
    pub agent_id: Uuid,
    pub evaluator_id: Uuid,
    pub year: i32,
    pub month: i32,
    pub performance: i32,
    pub kpi_rate: i32,
    pub revenue: i32,
    pub best_service: i32,
    pub customer_support: i32,
    pub total_rate: i32,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateSalesReportPayload {
    pub agent_id: Uuid,
    #[validate(range(min = 2000, max = 2100, message = "invalid_year"))]
    pub year: i32,
    #[validate(range(min = 1, max = 12, message = "invalid_month"))]
    pub month: i32,
    #[validate(range(min = 0, max = 100, message = "score_out_of_range"))]
    pub performance: i32,
    #[validate(range(min = 0, max = 100, message = "score_out_of_range"))]
    pub kpi_rate: i32,
    #[validate(range(min = 0, max = 100, message = "score_out_of_range"))]
    pub revenue: i32,
    #[validate(range(min = 0, max = 100, message = "score_out_of_range"))]
    pub best_service: i32,
    #[validate(range(min = 0, max = 100, message = "score_out_of_range"))]
    pub customer_support: i32,
}

impl CreateSalesReportPayload {
    /// Média das cinco notas como percentual inteiro (soma / 500 * 100).
    pub fn total_rate(&self) -> i32 {
        let sum = self.performance + self.kpi_rate + self.revenue + self.best_service + self.customer_support;
        sum * 100 / 500
    }
}
