// src/services/lead_service.rs

use sqlx::{Acquire, Executor, Postgres};

use crate::{
    common::{error::AppError, export::CsvExport},
    db::LeadRepository,
    models::lead::{FacetChoice, FacetField, LeadFilter, LeadOrdering, LeadPage, LeadScope, Page},
};

#[derive(Clone)]
pub struct LeadService {
    repo: LeadRepository,
}

impl LeadService {
    pub fn new(repo: LeadRepository) -> Self {
        Self { repo }
    }

    /// Listagem paginada. A ordenação é aplicada antes da paginação.
    pub async fn search<'e, A>(
        &self,
        conn: A,
        scope: LeadScope,
        filter: &LeadFilter,
        ordering: LeadOrdering,
        page: Page,
    ) -> Result<LeadPage, AppError>
    where
        A: Acquire<'e, Database = Postgres>,
    {
        let mut conn = conn.acquire().await?;

        let total = self.repo.count(&mut *conn, scope, filter).await?;
        let data = self.repo.search(&mut *conn, scope, filter, ordering, Some(page)).await?;

        Ok(LeadPage {
            total,
            page: page.number(),
            per_page: page.limit,
            data,
        })
    }

    /// Mesmo recorte da listagem, sem paginação.
    pub async fn export<'e, E>(
        &self,
        executor: E,
        scope: LeadScope,
        filter: &LeadFilter,
        ordering: LeadOrdering,
    ) -> Result<CsvExport, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let leads = self.repo.search(executor, scope, filter, ordering, None).await?;
        tracing::info!("📤 Exportando {} leads", leads.len());

        Ok(CsvExport::from_rows("leads.csv", &leads))
    }

    pub async fn facet_choices<'e, E>(
        &self,
        executor: E,
        scope: LeadScope,
        field: FacetField,
    ) -> Result<Vec<FacetChoice>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let values = self.repo.distinct_values(executor, scope, field).await?;

        Ok(values
            .into_iter()
            .map(|value| FacetChoice { display: value.clone(), value })
            .collect())
    }
}
