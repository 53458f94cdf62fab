// src/models/stats.rs

use serde::{Serialize, Serializer};
use sqlx::FromRow;
use uuid::Uuid;
use utoipa::ToSchema;

use crate::common::{
    dates::DateWindow,
    export::{CsvExport, CsvRow},
};

/// Percentual inteiro truncado em direção a zero; denominador zero vira 0.
pub fn percent(numerator: i64, denominator: i64) -> i64 {
    if denominator == 0 {
        return 0;
    }
    numerator * 100 / denominator
}

/// Serializa um percentual como "40%".
#[derive(Debug, Clone, Copy, PartialEq, Eq, ToSchema)]
#[schema(value_type = String, example = "40%")]
pub struct Rate(pub i64);

impl std::fmt::Display for Rate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}%", self.0)
    }
}

impl Serialize for Rate {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

// --- ESTATÍSTICAS POR AGENTE ---

/// Contagens cruas do histórico de ligações de um agente na janela.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, FromRow)]
pub struct CallTally {
    pub calls_made: i64,
    pub answered_calls: i64,
    pub converted: i64,
    pub interested: i64,
    pub not_interested: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AgentStats {
    pub agent_id: Uuid,
    pub agent: String,
    pub calls_made: i64,
    pub answered_calls: i64,
    pub conversion_rate: Rate,
    pub interested_rate: Rate,
    // Pode ser negativo: lead convertido sem nunca ter sido marcado "Interested".
    pub lost_rate: Rate,
    pub not_interested_rate: Rate,
}

impl AgentStats {
    pub fn from_tally(agent_id: Uuid, agent: String, t: CallTally) -> Self {
        Self {
            agent_id,
            agent,
            calls_made: t.calls_made,
            answered_calls: t.answered_calls,
            conversion_rate: Rate(percent(t.converted, t.answered_calls)),
            interested_rate: Rate(percent(t.interested, t.answered_calls)),
            lost_rate: Rate(percent(t.interested - t.converted, t.interested)),
            not_interested_rate: Rate(percent(t.not_interested, t.answered_calls)),
        }
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StatsReport {
    pub window: DateWindow,
    pub data: Vec<AgentStats>,
}

/// Linha da exportação: a janela é repetida em cada agente.
pub struct StatsExportRow<'a> {
    pub window: &'a DateWindow,
    pub stats: &'a AgentStats,
}

impl CsvRow for StatsExportRow<'_> {
    fn header() -> Vec<&'static str> {
        vec![
            "start date",
            "end date",
            "agent",
            "calls made",
            "answered calls",
            "conversion rate",
            "interested rate",
            "lost rate",
            "not interested rate",
        ]
    }

    fn values(&self) -> Vec<String> {
        let s = self.stats;
        vec![
            self.window.start_label(),
            self.window.end_label(),
            s.agent.clone(),
            s.calls_made.to_string(),
            s.answered_calls.to_string(),
            s.conversion_rate.to_string(),
            s.interested_rate.to_string(),
            s.lost_rate.to_string(),
            s.not_interested_rate.to_string(),
        ]
    }
}

impl StatsReport {
    pub fn to_csv(&self) -> CsvExport {
        let rows: Vec<StatsExportRow<'_>> = self
            .data
            .iter()
            .map(|stats| StatsExportRow { window: &self.window, stats })
            .collect();
        CsvExport::from_rows("stats.csv", &rows)
    }
}

// --- DASHBOARD DA ORGANIZAÇÃO ---

#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct CategoryCount {
    pub name: String,
    pub leads_count: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CategoryShare {
    pub name: String,
    pub leads_count: i64,
    pub percentage: Rate,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSummary {
    pub window: DateWindow,
    pub total_lead_count: i64,
    pub converted_lead_count: i64,
    pub unassigned_lead_percentage: Rate,
    pub categories: Vec<CategoryShare>,
}

impl DashboardSummary {
    pub fn build(
        window: DateWindow,
        total: i64,
        converted: i64,
        uncategorised: i64,
        counts: Vec<CategoryCount>,
    ) -> Self {
        let categories = counts
            .into_iter()
            .map(|c| CategoryShare {
                percentage: Rate(percent(c.leads_count, total)),
                name: c.name,
                leads_count: c.leads_count,
            })
            .collect();

        Self {
            window,
            total_lead_count: total,
            converted_lead_count: converted,
            unassigned_lead_percentage: Rate(percent(uncategorised, total)),
            categories,
        }
    }

    /// Uma única linha: colunas fixas seguidas de uma coluna por categoria.
    pub fn export_columns(&self) -> (Vec<String>, Vec<String>) {
        let mut header = vec![
            "total_lead_count".to_string(),
            "converted_lead_count".to_string(),
            "start_date".to_string(),
            "end_date".to_string(),
            "unassigned_lead_count".to_string(),
        ];
        let mut row = vec![
            self.total_lead_count.to_string(),
            self.converted_lead_count.to_string(),
            self.window.start_label(),
            self.window.end_label(),
            self.unassigned_lead_percentage.to_string(),
        ];
        for c in &self.categories {
            header.push(c.name.clone());
            row.push(c.percentage.to_string());
        }
        (header, row)
    }

    pub fn to_csv(&self) -> CsvExport {
        let (header, row) = self.export_columns();
        CsvExport { filename: "dashboard.csv", header, rows: vec![row] }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn stats(t: CallTally) -> AgentStats {
        AgentStats::from_tally(Uuid::nil(), "Ana Souza".into(), t)
    }

    #[test]
    fn rates_from_reference_tally() {
        let s = stats(CallTally {
            calls_made: 10,
            answered_calls: 5,
            converted: 2,
            interested: 3,
            not_interested: 1,
        });

        assert_eq!(s.calls_made, 10);
        assert_eq!(s.answered_calls, 5);
        assert_eq!(s.conversion_rate.to_string(), "40%");
        assert_eq!(s.interested_rate.to_string(), "60%");
        assert_eq!(s.not_interested_rate.to_string(), "20%");
        assert_eq!(s.lost_rate.to_string(), "33%");
    }

    #[test]
    fn zero_calls_report_zero_everywhere() {
        let s = stats(CallTally::default());
        for rate in [s.conversion_rate, s.interested_rate, s.lost_rate, s.not_interested_rate] {
            assert_eq!(rate.to_string(), "0%");
        }
    }

    #[test]
    fn answered_without_interest_keeps_lost_rate_at_zero() {
        let s = stats(CallTally { calls_made: 4, answered_calls: 4, converted: 1, ..Default::default() });
        assert_eq!(s.conversion_rate.to_string(), "25%");
        assert_eq!(s.lost_rate.to_string(), "0%");
    }

    #[test]
    fn lost_rate_stays_signed_when_conversions_exceed_interest() {
        let s = stats(CallTally {
            calls_made: 5,
            answered_calls: 5,
            converted: 3,
            interested: 2,
            not_interested: 0,
        });
        // (2 - 3) / 2 * 100 = -50, preservado sem clamp
        assert_eq!(s.lost_rate, Rate(-50));
        assert_eq!(s.lost_rate.to_string(), "-50%");
    }

    #[test]
    fn percent_truncates_toward_zero() {
        assert_eq!(percent(1, 3), 33);
        assert_eq!(percent(2, 3), 66);
        assert_eq!(percent(-1, 3), -33);
        assert_eq!(percent(29, 100), 29);
        assert_eq!(percent(5, 0), 0);
    }

    #[test]
    fn rates_serialize_as_percentage_strings() {
        let s = stats(CallTally { calls_made: 2, answered_calls: 2, converted: 1, interested: 1, not_interested: 0 });
        let json = serde_json::to_value(&s).unwrap();
        assert_eq!(json["conversionRate"], "50%");
        assert_eq!(json["callsMade"], 2);
    }

    #[test]
    fn export_row_repeats_window() {
        let day = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
        let window = DateWindow { start: day, end: day };
        let s = stats(CallTally::default());
        let row = StatsExportRow { window: &window, stats: &s };

        let values = row.values();
        assert_eq!(values.len(), StatsExportRow::header().len());
        assert_eq!(&values[..3], &["2024-01-02", "2024-01-02", "Ana Souza"]);
    }

    #[test]
    fn dashboard_percentages_are_zero_safe() {
        let day = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
        let window = DateWindow { start: day, end: day };

        let empty = DashboardSummary::build(
            window,
            0,
            0,
            0,
            vec![CategoryCount { name: "Converted".into(), leads_count: 0 }],
        );
        assert_eq!(empty.unassigned_lead_percentage, Rate(0));
        assert_eq!(empty.categories[0].percentage, Rate(0));

        let busy = DashboardSummary::build(
            window,
            8,
            2,
            3,
            vec![CategoryCount { name: "Converted".into(), leads_count: 2 }],
        );
        assert_eq!(busy.categories[0].percentage, Rate(25));
        assert_eq!(busy.unassigned_lead_percentage, Rate(37));

        let (header, row) = busy.export_columns();
        assert_eq!(header.len(), row.len());
        assert_eq!(header.last().map(String::as_str), Some("Converted"));
        assert_eq!(row.last().map(String::as_str), Some("25%"));
    }
}
