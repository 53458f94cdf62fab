// src/models/lead.rs

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use utoipa::ToSchema;
use validator::Validate;

use crate::common::{dates::blank_date, error::AppError, export::CsvRow};

// --- LEAD (linha da listagem, já com nomes de agente/categoria/tags) ---

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LeadRow {
    pub id: Uuid,
    pub organisation_id: Uuid,
    pub agent_id: Option<Uuid>,
    pub agent_name: Option<String>,
    pub category_id: Option<Uuid>,
    pub category_name: Option<String>,

    pub first_name: String,
    pub last_name: String,
    pub source: String,
    pub service: String,
    pub email: String,
    pub phone_number: String,
    pub country: String,
    pub campaign: String,

    pub tags: Vec<String>,

    pub created_at: DateTime<Utc>,
    pub converted_at: Option<DateTime<Utc>>,
    pub last_called: Option<DateTime<Utc>>,
}

impl CsvRow for LeadRow {
    fn header() -> Vec<&'static str> {
        vec![
            "FIRST NAME",
            "LAST NAME",
            "SOURCE",
            "EMAIL",
            "CELL PHONE NUMBER",
            "COUNTRY",
            "CAMPAIGN",
            "AGENT",
            "CATEGORY",
            "DATE",
        ]
    }

    fn values(&self) -> Vec<String> {
        vec![
            self.first_name.clone(),
            self.last_name.clone(),
            self.source.clone(),
            self.email.clone(),
            self.phone_number.clone(),
            self.country.clone(),
            self.campaign.clone(),
            self.agent_name.clone().unwrap_or_else(|| "Unassigned".to_string()),
            self.category_name.clone().unwrap_or_else(|| "New".to_string()),
            self.created_at.date_naive().format("%Y-%m-%d").to_string(),
        ]
    }
}

// --- IMPORTAÇÃO ---

/// Linha bruta vinda do adaptador de importação (CSV/planilha já parseados).
/// Campo obrigatório ausente derruba o lote inteiro na desserialização.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ImportRow {
    pub phone_number: String,
    pub first_name: String,
    pub last_name: String,
    pub source: String,
    pub service: String,
    pub email: String,
    pub country: String,
    pub campaign: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ImportSummary {
    pub received: usize,
    pub inserted: u64,
    pub skipped: u64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReassignSummary {
    pub updated: u64,
}

// --- ESCOPO, FILTRO E ORDENAÇÃO ---

/// Recorte aplicado antes de qualquer filtro: organização e, para agentes, só os próprios leads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LeadScope {
    pub organisation_id: Uuid,
    pub agent_id: Option<Uuid>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LeadFilter {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub phone_number: Option<String>,

    #[serde(default)]
    pub source: Vec<String>,
    #[serde(default)]
    pub service: Vec<String>,
    #[serde(default)]
    pub country: Vec<String>,
    #[serde(default)]
    pub campaign: Vec<String>,

    #[serde(default, deserialize_with = "blank_uuids::deserialize")]
    pub agent: Vec<Uuid>,
    #[serde(default, deserialize_with = "blank_uuids::deserialize")]
    pub category: Vec<Uuid>,
    #[serde(default, deserialize_with = "blank_uuids::deserialize")]
    pub tag: Vec<Uuid>,

    #[serde(default, deserialize_with = "blank_date::deserialize")]
    pub start_date: Option<NaiveDate>,
    #[serde(default, deserialize_with = "blank_date::deserialize")]
    pub end_date: Option<NaiveDate>,
}

/// Texto em branco não restringe nada.
pub fn active_text(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

/// Seleções vazias ou só com valores em branco não restringem nada.
pub fn active_choices(values: &[String]) -> Vec<String> {
    values
        .iter()
        .map(|v| v.trim())
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .collect()
}

/// Multi-seleção de ids: `?agent=` (em branco) é ignorado, id malformado continua sendo erro.
pub mod blank_uuids {
    use serde::{Deserialize, Deserializer};
    use uuid::Uuid;

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Vec<Uuid>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw: Vec<String> = Vec::deserialize(deserializer)?;
        raw.iter()
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
            .map(|v| Uuid::parse_str(v).map_err(serde::de::Error::custom))
            .collect()
    }
}

/// Filtro de data de criação.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreatedOn {
    Between(NaiveDate, NaiveDate),
    Day(NaiveDate),
}

impl LeadFilter {
    pub fn created_on(&self) -> Option<CreatedOn> {
        match (self.start_date, self.end_date) {
            (Some(start), Some(end)) => Some(CreatedOn::Between(start, end)),
            (Some(start), None) => Some(CreatedOn::Day(start)),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortField {
    Country,
    Campaign,
    Agent,
    Category,
    Date,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LeadOrdering {
    pub field: SortField,
    pub direction: SortDirection,
}

impl Default for LeadOrdering {
    fn default() -> Self {
        Self { field: SortField::Date, direction: SortDirection::Desc }
    }
}

impl LeadOrdering {
    /// Formato do parâmetro `order_by`: `<campo>_<asc|desc>`, ex: `country_asc`.
    pub fn parse(raw: Option<&str>) -> Result<Self, AppError> {
        let raw = match raw.map(str::trim) {
            None | Some("") => return Ok(Self::default()),
            Some(r) => r,
        };

        let (field, direction) = raw
            .rsplit_once('_')
            .ok_or_else(|| AppError::invalid(format!("order_by desconhecido: {}", raw)))?;

        let field = match field {
            "country" => SortField::Country,
            "campaign" => SortField::Campaign,
            "agent" => SortField::Agent,
            "category" => SortField::Category,
            "date" => SortField::Date,
            _ => return Err(AppError::invalid(format!("order_by desconhecido: {}", raw))),
        };
        let direction = match direction {
            "asc" => SortDirection::Asc,
            "desc" => SortDirection::Desc,
            _ => return Err(AppError::invalid(format!("order_by desconhecido: {}", raw))),
        };

        Ok(Self { field, direction })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub limit: i64,
    pub offset: i64,
}

impl Page {
    pub const DEFAULT_SIZE: i64 = 25;
    pub const MAX_SIZE: i64 = 200;

    pub fn new(page: Option<i64>, per_page: Option<i64>) -> Self {
        let limit = per_page.unwrap_or(Self::DEFAULT_SIZE).clamp(1, Self::MAX_SIZE);
        let page = page.unwrap_or(1).max(1);
        // Página absurda vira um OFFSET enorme (lista vazia), nunca overflow.
        Self { limit, offset: (page - 1).saturating_mul(limit) }
    }

    pub fn number(&self) -> i64 {
        self.offset / self.limit + 1
    }
}

/// Parâmetros de listagem que não são filtro.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListParams {
    pub order_by: Option<String>,
    pub page: Option<i64>,
    pub per_page: Option<i64>,
    pub export: Option<u8>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LeadPage {
    pub total: i64,
    pub page: i64,
    pub per_page: i64,
    pub data: Vec<LeadRow>,
}

// --- FACETAS (opções dos filtros de múltipla escolha) ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FacetField {
    Source,
    Service,
    Country,
    Campaign,
}

impl FacetField {
    pub fn column(self) -> &'static str {
        match self {
            FacetField::Source => "source",
            FacetField::Service => "service",
            FacetField::Country => "country",
            FacetField::Campaign => "campaign",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct FacetChoice {
    pub value: String,
    pub display: String,
}

// --- RESULTADO DE LIGAÇÃO ---

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LogCallPayload {
    /// Ausente mantém a categoria atual.
    pub category_id: Option<Uuid>,
    /// Substitui o conjunto de tags do lead; vazio remove todas.
    #[serde(default)]
    #[validate(length(max = 20, message = "too_many_tags"))]
    pub tag_ids: Vec<Uuid>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_ordering_is_newest_first() {
        assert_eq!(LeadOrdering::parse(None).unwrap(), LeadOrdering::default());
        assert_eq!(LeadOrdering::parse(Some("  ")).unwrap(), LeadOrdering::default());
        assert_eq!(LeadOrdering::default().direction, SortDirection::Desc);
    }

    #[test]
    fn parses_every_sort_key() {
        let o = LeadOrdering::parse(Some("agent_asc")).unwrap();
        assert_eq!((o.field, o.direction), (SortField::Agent, SortDirection::Asc));

        let o = LeadOrdering::parse(Some("category_desc")).unwrap();
        assert_eq!((o.field, o.direction), (SortField::Category, SortDirection::Desc));

        for key in ["country_asc", "campaign_desc", "date_asc"] {
            assert!(LeadOrdering::parse(Some(key)).is_ok(), "{}", key);
        }
    }

    #[test]
    fn unknown_sort_key_is_invalid_argument() {
        for key in ["name_asc", "country", "date_up"] {
            assert!(matches!(
                LeadOrdering::parse(Some(key)),
                Err(AppError::InvalidArgument(_))
            ));
        }
    }

    #[test]
    fn blank_filters_are_inactive() {
        assert_eq!(active_text(&Some("   ".into())), None);
        assert_eq!(active_text(&Some(" ana ".into())), Some("ana"));
        assert_eq!(active_choices(&["".into(), "Egypt".into()]), vec!["Egypt".to_string()]);
    }

    fn filter_from(uri: &str) -> Result<LeadFilter, String> {
        let uri: axum::http::Uri = uri.parse().unwrap();
        axum_extra::extract::Query::<LeadFilter>::try_from_uri(&uri)
            .map(|q| q.0)
            .map_err(|e| e.to_string())
    }

    #[test]
    fn blank_query_values_are_no_restriction() {
        let filter = filter_from("/api/leads?first_name=&agent=&category=&tag=&source=&start_date=").unwrap();

        assert!(filter.agent.is_empty());
        assert!(filter.category.is_empty());
        assert!(filter.tag.is_empty());
        assert!(active_choices(&filter.source).is_empty());
        assert_eq!(active_text(&filter.first_name), None);
        assert_eq!(filter.created_on(), None);
    }

    #[test]
    fn repeated_id_params_skip_blanks_and_keep_the_rest() {
        let id = Uuid::from_u128(7);
        let filter = filter_from(&format!("/api/leads?agent=&agent={id}&tag={id}")).unwrap();

        assert_eq!(filter.agent, vec![id]);
        assert_eq!(filter.tag, vec![id]);
    }

    #[test]
    fn malformed_id_is_still_rejected() {
        assert!(filter_from("/api/leads?agent=nao-e-uuid").is_err());
    }

    #[test]
    fn end_date_alone_does_not_restrict() {
        let day = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();

        let f = LeadFilter { end_date: Some(day), ..Default::default() };
        assert_eq!(f.created_on(), None);

        let f = LeadFilter { start_date: Some(day), ..Default::default() };
        assert_eq!(f.created_on(), Some(CreatedOn::Day(day)));
    }

    #[test]
    fn page_is_clamped() {
        assert_eq!(Page::new(None, None), Page { limit: 25, offset: 0 });
        assert_eq!(Page::new(Some(3), Some(10)), Page { limit: 10, offset: 20 });
        assert_eq!(Page::new(Some(0), Some(10_000)), Page { limit: 200, offset: 0 });
    }

    #[test]
    fn huge_page_numbers_saturate_instead_of_overflowing() {
        let page = Page::new(Some(i64::MAX), Some(25));
        assert_eq!(page.limit, 25);
        assert_eq!(page.offset, i64::MAX);
        assert!(page.number() > 1);

        assert_eq!(Page::new(Some(i64::MIN), None), Page { limit: 25, offset: 0 });
    }

    #[test]
    fn csv_row_uses_placeholders_for_missing_relations() {
        let row = LeadRow {
            id: Uuid::nil(),
            organisation_id: Uuid::nil(),
            agent_id: None,
            agent_name: None,
            category_id: None,
            category_name: None,
            first_name: "Ana".into(),
            last_name: "Souza".into(),
            source: "facebook".into(),
            service: "".into(),
            email: "ana@x.com".into(),
            phone_number: "555".into(),
            country: "BR".into(),
            campaign: "spring".into(),
            tags: vec![],
            created_at: "2024-05-01T10:00:00Z".parse().unwrap(),
            converted_at: None,
            last_called: None,
        };

        let values = row.values();
        assert_eq!(values.len(), LeadRow::header().len());
        assert_eq!(values[7], "Unassigned");
        assert_eq!(values[8], "New");
        assert_eq!(values[9], "2024-05-01");
    }
}
