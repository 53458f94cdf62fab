// src/db/lead_repo.rs

use std::collections::HashSet;

use sqlx::{Executor, PgConnection, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::agent::CATEGORY_CONVERTED,
    models::lead::{
        active_choices, active_text, CreatedOn, FacetField, ImportRow, LeadFilter, LeadOrdering,
        LeadRow, LeadScope, Page, SortDirection, SortField,
    },
};

// Postgres aceita até 65535 binds por statement; 10 colunas por linha.
const INSERT_CHUNK: usize = 1000;

const LEAD_SELECT: &str = r#"
SELECT
    l.id, l.organisation_id, l.agent_id,
    a.first_name || ' ' || a.last_name AS agent_name,
    l.category_id, c.name AS category_name,
    l.first_name, l.last_name, l.source, l.service, l.email,
    l.phone_number, l.country, l.campaign,
    ARRAY(
        SELECT t.name FROM lead_tags lt
        JOIN tags t ON t.id = lt.tag_id
        WHERE lt.lead_id = l.id
        ORDER BY t.name
    ) AS tags,
    l.created_at, l.converted_at, l.last_called
FROM leads l
LEFT JOIN agents a ON a.id = l.agent_id
LEFT JOIN categories c ON c.id = l.category_id"#;

const LEAD_COUNT: &str = r#"
SELECT COUNT(*)
FROM leads l
LEFT JOIN agents a ON a.id = l.agent_id
LEFT JOIN categories c ON c.id = l.category_id"#;

#[derive(Clone, Default)]
pub struct LeadRepository;

impl LeadRepository {
    pub fn new() -> Self {
        Self
    }

    // =========================================================================
    //  IMPORTAÇÃO E ATRIBUIÇÃO
    // =========================================================================

    /// Quais telefones do lote já existem na organização
    pub async fn existing_phone_numbers<'e, E>(
        &self,
        executor: E,
        organisation_id: Uuid,
        phone_numbers: &[String],
    ) -> Result<HashSet<String>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        if phone_numbers.is_empty() {
            return Ok(HashSet::new());
        }

        let found = sqlx::query_scalar::<_, String>(
            r#"
            SELECT phone_number FROM leads
            WHERE organisation_id = $1 AND phone_number = ANY($2)
            "#,
        )
            .bind(organisation_id)
            .bind(phone_numbers)
            .fetch_all(executor)
            .await?;

        Ok(found.into_iter().collect())
    }

    /// Insere o lote em blocos. Telefone já existente (corrida com outra importação) é ignorado.
    pub async fn insert_leads(
        &self,
        conn: &mut PgConnection,
        organisation_id: Uuid,
        agent_id: Option<Uuid>,
        rows: &[ImportRow],
    ) -> Result<u64, AppError> {
        let mut inserted = 0;

        for chunk in rows.chunks(INSERT_CHUNK) {
            let mut qb = build_insert_query(organisation_id, agent_id, chunk);
            let result = qb.build().execute(&mut *conn).await?;

            tracing::debug!("Bloco de {} leads: {} inseridos", chunk.len(), result.rows_affected());
            inserted += result.rows_affected();
        }

        Ok(inserted)
    }

    pub async fn assign_agent<'e, E>(
        &self,
        executor: E,
        organisation_id: Uuid,
        agent_id: Uuid,
        lead_ids: &[Uuid],
    ) -> Result<u64, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        if lead_ids.is_empty() {
            return Ok(0);
        }

        let result = sqlx::query(
            r#"
            UPDATE leads SET agent_id = $1
            WHERE organisation_id = $2 AND id = ANY($3)
            "#,
        )
            .bind(agent_id)
            .bind(organisation_id)
            .bind(lead_ids)
            .execute(executor)
            .await?;

        Ok(result.rows_affected())
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
        let result = sqlx::query("DELETE FROM leads WHERE organisation_id = $1 AND id = ANY($2)")
            .bind(organisation_id)
            .bind(lead_ids)
            .execute(executor)
            .await?;

        Ok(result.rows_affected())
    }

    // =========================================================================
    //  BUSCA
    // =========================================================================

    pub async fn search<'e, E>(
        &self,
        executor: E,
        scope: LeadScope,
        filter: &LeadFilter,
        ordering: LeadOrdering,
        page: Option<Page>,
    ) -> Result<Vec<LeadRow>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let mut qb = build_search_query(scope, filter, ordering, page);
        let leads = qb.build_query_as::<LeadRow>().fetch_all(executor).await?;

        Ok(leads)
    }

    pub async fn count<'e, E>(
        &self,
        executor: E,
        scope: LeadScope,
        filter: &LeadFilter,
    ) -> Result<i64, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let mut qb = QueryBuilder::new(LEAD_COUNT);
        push_where(&mut qb, scope, filter);
        let total = qb.build_query_scalar::<i64>().fetch_one(executor).await?;

        Ok(total)
    }

    pub async fn find_in_scope<'e, E>(
        &self,
        executor: E,
        scope: LeadScope,
        lead_id: Uuid,
    ) -> Result<Option<LeadRow>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let mut qb = QueryBuilder::new(LEAD_SELECT);
        push_scope(&mut qb, scope);
        qb.push(" AND l.id = ").push_bind(lead_id);

        let lead = qb.build_query_as::<LeadRow>().fetch_optional(executor).await?;
        Ok(lead)
    }

    /// Valores distintos (não vazios) de uma faceta, para montar os filtros.
    pub async fn distinct_values<'e, E>(
        &self,
        executor: E,
        scope: LeadScope,
        field: FacetField,
    ) -> Result<Vec<String>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let mut qb = build_facet_query(scope, field);
        let values = qb.build_query_scalar::<String>().fetch_all(executor).await?;

        Ok(values)
    }

    // =========================================================================
    //  LIGAÇÕES
    // =========================================================================

    /// Marca a ligação agora, troca categoria (quando informada) e carimba `converted_at` na primeira conversão.
    /// As tags são sempre substituídas pelas informadas.
    pub async fn record_call(
        &self,
        conn: &mut PgConnection,
        organisation_id: Uuid,
        lead_id: Uuid,
        category_id: Option<Uuid>,
        tag_ids: &[Uuid],
    ) -> Result<(), AppError> {
        let result = sqlx::query(
            r#"
            UPDATE leads l SET
                last_called = NOW(),
                category_id = COALESCE($3, l.category_id),
                converted_at = CASE
                    WHEN l.converted_at IS NULL AND EXISTS (
                        SELECT 1 FROM categories c WHERE c.id = $3 AND c.name = $4
                    ) THEN NOW()
                    ELSE l.converted_at
                END
            WHERE l.id = $1 AND l.organisation_id = $2
            "#,
        )
            .bind(lead_id)
            .bind(organisation_id)
            .bind(category_id)
            .bind(CATEGORY_CONVERTED)
            .execute(&mut *conn)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Lead"));
        }

        sqlx::query("DELETE FROM lead_tags WHERE lead_id = $1")
            .bind(lead_id)
            .execute(&mut *conn)
            .await?;

        if !tag_ids.is_empty() {
            sqlx::query(
                r#"
                INSERT INTO lead_tags (lead_id, tag_id)
                SELECT $1, t.id FROM tags t WHERE t.id = ANY($2)
                ON CONFLICT DO NOTHING
                "#,
            )
                .bind(lead_id)
                .bind(tag_ids)
                .execute(&mut *conn)
                .await?;
        }

        Ok(())
    }
}

// =============================================================================
//  MONTAGEM DE SQL
// =============================================================================

fn build_insert_query(
    organisation_id: Uuid,
    agent_id: Option<Uuid>,
    rows: &[ImportRow],
) -> QueryBuilder<'static, Postgres> {
    let mut qb = QueryBuilder::new(
        "INSERT INTO leads (organisation_id, agent_id, first_name, last_name, source, service, email, phone_number, country, campaign) ",
    );

    qb.push_values(rows, |mut b, row| {
        b.push_bind(organisation_id)
            .push_bind(agent_id)
            .push_bind(row.first_name.clone())
            .push_bind(row.last_name.clone())
            .push_bind(row.source.clone())
            .push_bind(row.service.clone())
            .push_bind(row.email.clone())
            .push_bind(row.phone_number.clone())
            .push_bind(row.country.clone())
            .push_bind(row.campaign.clone());
    });
    qb.push(" ON CONFLICT (organisation_id, phone_number) DO NOTHING");

    qb
}

pub(crate) fn build_search_query(
    scope: LeadScope,
    filter: &LeadFilter,
    ordering: LeadOrdering,
    page: Option<Page>,
) -> QueryBuilder<'static, Postgres> {
    let mut qb = QueryBuilder::new(LEAD_SELECT);
    push_where(&mut qb, scope, filter);
    push_ordering(&mut qb, ordering);

    if let Some(page) = page {
        qb.push(" LIMIT ").push_bind(page.limit);
        qb.push(" OFFSET ").push_bind(page.offset);
    }

    qb
}

fn build_facet_query(scope: LeadScope, field: FacetField) -> QueryBuilder<'static, Postgres> {
    let column = field.column();
    let mut qb = QueryBuilder::new(format!("SELECT DISTINCT l.{column} FROM leads l"));
    push_scope(&mut qb, scope);
    qb.push(format!(" AND l.{column} <> '' ORDER BY l.{column} ASC"));
    qb
}

/// Escopo: sempre a organização; agentes só enxergam os próprios leads.
fn push_scope(qb: &mut QueryBuilder<'static, Postgres>, scope: LeadScope) {
    qb.push(" WHERE l.organisation_id = ").push_bind(scope.organisation_id);
    if let Some(agent_id) = scope.agent_id {
        qb.push(" AND l.agent_id = ").push_bind(agent_id);
    }
}

fn push_where(qb: &mut QueryBuilder<'static, Postgres>, scope: LeadScope, filter: &LeadFilter) {
    push_scope(qb, scope);

    // Texto: substring sem diferenciar maiúsculas; e-mail é prefixo (como no formulário original)
    if let Some(v) = active_text(&filter.first_name) {
        qb.push(" AND l.first_name ILIKE '%' || ").push_bind(escape_like(v)).push(" || '%'");
    }
    if let Some(v) = active_text(&filter.last_name) {
        qb.push(" AND l.last_name ILIKE '%' || ").push_bind(escape_like(v)).push(" || '%'");
    }
    if let Some(v) = active_text(&filter.email) {
        qb.push(" AND l.email LIKE ").push_bind(escape_like(v)).push(" || '%'");
    }
    if let Some(v) = active_text(&filter.phone_number) {
        qb.push(" AND l.phone_number ILIKE '%' || ").push_bind(escape_like(v)).push(" || '%'");
    }

    // Facetas: OR dentro do campo, AND entre campos
    for (column, values) in [
        ("source", &filter.source),
        ("service", &filter.service),
        ("country", &filter.country),
        ("campaign", &filter.campaign),
    ] {
        let selected = active_choices(values);
        if !selected.is_empty() {
            qb.push(format!(" AND l.{column} = ANY(")).push_bind(selected).push(")");
        }
    }

    if !filter.agent.is_empty() {
        qb.push(" AND l.agent_id = ANY(").push_bind(filter.agent.clone()).push(")");
    }
    if !filter.category.is_empty() {
        qb.push(" AND l.category_id = ANY(").push_bind(filter.category.clone()).push(")");
    }
    if !filter.tag.is_empty() {
        qb.push(" AND EXISTS (SELECT 1 FROM lead_tags ft WHERE ft.lead_id = l.id AND ft.tag_id = ANY(")
            .push_bind(filter.tag.clone())
            .push("))");
    }

    match filter.created_on() {
        Some(CreatedOn::Between(start, end)) => {
            qb.push(" AND l.created_at::date BETWEEN ").push_bind(start);
            qb.push(" AND ").push_bind(end);
        }
        Some(CreatedOn::Day(day)) => {
            qb.push(" AND l.created_at::date = ").push_bind(day);
        }
        None => {}
    }
}

fn push_ordering(qb: &mut QueryBuilder<'static, Postgres>, ordering: LeadOrdering) {
    let columns: &[&str] = match ordering.field {
        SortField::Country => &["l.country"],
        SortField::Campaign => &["l.campaign"],
        SortField::Agent => &["a.first_name", "a.last_name"],
        SortField::Category => &["c.name"],
        SortField::Date => &["l.created_at"],
    };
    let direction = match ordering.direction {
        SortDirection::Asc => "ASC",
        SortDirection::Desc => "DESC",
    };

    let terms: Vec<String> = columns
        .iter()
        .chain(std::iter::once(&"l.id"))
        .map(|c| format!("{c} {direction}"))
        .collect();
    qb.push(" ORDER BY ").push(terms.join(", "));
}

fn escape_like(value: &str) -> String {
    value.replace('\\', "\\\\").replace('%', "\\%").replace('_', "\\_")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn org_scope() -> LeadScope {
        LeadScope { organisation_id: Uuid::nil(), agent_id: None }
    }

    fn where_clause(scope: LeadScope, filter: &LeadFilter) -> String {
        let qb = build_search_query(scope, filter, LeadOrdering::default(), None);
        let sql = qb.sql().to_string();
        let start = sql.find(" WHERE l.organisation_id").unwrap();
        // O ORDER BY da subconsulta de tags vem antes do WHERE; o da listagem é o último.
        let end = sql.rfind(" ORDER BY ").unwrap();
        sql[start..end].to_string()
    }

    #[test]
    fn empty_filter_keeps_only_the_organisation_scope() {
        let sql = where_clause(org_scope(), &LeadFilter::default());
        assert_eq!(sql, " WHERE l.organisation_id = $1");
    }

    #[test]
    fn agent_callers_are_scoped_to_their_own_leads() {
        let scope = LeadScope { organisation_id: Uuid::nil(), agent_id: Some(Uuid::nil()) };
        let sql = where_clause(scope, &LeadFilter::default());
        assert_eq!(sql, " WHERE l.organisation_id = $1 AND l.agent_id = $2");
    }

    #[test]
    fn blank_values_impose_no_restriction() {
        let filter = LeadFilter {
            first_name: Some("  ".into()),
            email: Some("".into()),
            source: vec!["".into()],
            ..Default::default()
        };
        assert_eq!(where_clause(org_scope(), &filter), " WHERE l.organisation_id = $1");
    }

    #[test]
    fn each_active_filter_adds_one_and_clause() {
        let day = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
        let filter = LeadFilter {
            first_name: Some("ana".into()),
            last_name: Some("sou".into()),
            email: Some("ana@".into()),
            phone_number: Some("555".into()),
            source: vec!["facebook".into(), "google".into()],
            service: vec!["seo".into()],
            country: vec!["BR".into()],
            campaign: vec!["spring".into()],
            agent: vec![Uuid::nil()],
            category: vec![Uuid::nil()],
            tag: vec![Uuid::nil()],
            start_date: Some(day),
            end_date: Some(day),
        };

        let sql = where_clause(org_scope(), &filter);
        let top_level_ands = sql.matches(" AND l.").count() + sql.matches(" AND EXISTS").count();

        // 4 texto + 4 facetas + agente + categoria + tag + data
        assert_eq!(top_level_ands, 12);
        assert!(sql.contains("l.first_name ILIKE '%' || $2 || '%'"));
        assert!(sql.contains("l.email LIKE $4 || '%'"));
        assert!(sql.contains("l.source = ANY($6)"));
        assert!(sql.contains("ft.tag_id = ANY($12)"));
        assert!(sql.contains("l.created_at::date BETWEEN $13 AND $14"));
    }

    #[test]
    fn filters_combine_as_the_intersection_of_single_filters() {
        let by_country = LeadFilter { country: vec!["BR".into()], ..Default::default() };
        let by_source = LeadFilter { source: vec!["ads".into()], ..Default::default() };
        let both = LeadFilter { country: vec!["BR".into()], source: vec!["ads".into()], ..Default::default() };

        let country_clause = where_clause(org_scope(), &by_country).replace(" WHERE l.organisation_id = $1", "");
        let source_clause = where_clause(org_scope(), &by_source).replace(" WHERE l.organisation_id = $1", "");
        let combined = where_clause(org_scope(), &both);

        assert_eq!(country_clause, " AND l.country = ANY($2)");
        assert_eq!(source_clause, " AND l.source = ANY($2)");
        assert_eq!(
            combined,
            " WHERE l.organisation_id = $1 AND l.source = ANY($2) AND l.country = ANY($3)"
        );
    }

    #[test]
    fn start_date_alone_filters_a_single_day() {
        let day = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
        let filter = LeadFilter { start_date: Some(day), ..Default::default() };
        assert_eq!(
            where_clause(org_scope(), &filter),
            " WHERE l.organisation_id = $1 AND l.created_at::date = $2"
        );
    }

    #[test]
    fn ordering_and_pagination_follow_the_filters() {
        let ordering = LeadOrdering::parse(Some("agent_asc")).unwrap();
        let qb = build_search_query(org_scope(), &LeadFilter::default(), ordering, Some(Page::new(Some(2), Some(10))));
        assert!(qb
            .sql()
            .ends_with(" ORDER BY a.first_name ASC, a.last_name ASC, l.id ASC LIMIT $2 OFFSET $3"));

        let qb = build_search_query(org_scope(), &LeadFilter::default(), LeadOrdering::default(), None);
        assert!(qb.sql().ends_with(" ORDER BY l.created_at DESC, l.id DESC"));
    }

    #[test]
    fn facet_query_skips_blank_values() {
        let qb = build_facet_query(org_scope(), FacetField::Campaign);
        assert_eq!(
            qb.sql(),
            "SELECT DISTINCT l.campaign FROM leads l WHERE l.organisation_id = $1 AND l.campaign <> '' ORDER BY l.campaign ASC"
        );
    }

    #[test]
    fn bulk_insert_skips_conflicting_phone_numbers() {
        let row = ImportRow {
            phone_number: "1".into(),
            first_name: "a".into(),
            last_name: "b".into(),
            source: "".into(),
            service: "".into(),
            email: "".into(),
            country: "".into(),
            campaign: "".into(),
        };
        let qb = build_insert_query(Uuid::nil(), None, &[row.clone(), row]);
        let sql = qb.sql();

        assert!(sql.contains("($11, $12, $13, $14, $15, $16, $17, $18, $19, $20)"));
        assert!(sql.ends_with(" ON CONFLICT (organisation_id, phone_number) DO NOTHING"));
    }

    #[test]
    fn like_wildcards_in_input_are_escaped() {
        assert_eq!(escape_like("50%_off\\"), "50\\%\\_off\\\\");
    }
}
