// src/db/stats_repo.rs

use sqlx::{Acquire, Executor, Postgres};
use uuid::Uuid;

use crate::{
    common::{dates::DateWindow, error::AppError},
    models::agent::{CATEGORY_CONVERTED, CATEGORY_NOT_INTERESTED, TAG_ANSWERED, TAG_INTERESTED},
    models::stats::{CallTally, CategoryCount, DashboardSummary},
};

#[derive(Clone, Default)]
pub struct StatsRepository;

impl StatsRepository {
    pub fn new() -> Self {
        Self
    }

    /// Contagens do agente para ligações com `last_called` dentro da janela (datas inclusivas).
    pub async fn call_tally<'e, E>(
        &self,
        executor: E,
        agent_id: Uuid,
        window: DateWindow,
    ) -> Result<CallTally, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let tally = sqlx::query_as::<_, CallTally>(
            r#"
            WITH calls AS (
                SELECT l.id, l.category_id
                FROM leads l
                WHERE l.agent_id = $1
                  AND l.last_called IS NOT NULL
                  AND l.last_called::date BETWEEN $2 AND $3
            ),
            answered AS (
                SELECT c.id, c.category_id
                FROM calls c
                WHERE EXISTS (
                    SELECT 1 FROM lead_tags lt JOIN tags t ON t.id = lt.tag_id
                    WHERE lt.lead_id = c.id AND t.name = $4
                )
            )
            SELECT
                (SELECT COUNT(*) FROM calls) AS calls_made,
                (SELECT COUNT(*) FROM answered) AS answered_calls,
                (SELECT COUNT(*) FROM answered a
                    JOIN categories cat ON cat.id = a.category_id
                    WHERE cat.name = $5) AS converted,
                (SELECT COUNT(*) FROM answered a
                    WHERE EXISTS (
                        SELECT 1 FROM lead_tags lt JOIN tags t ON t.id = lt.tag_id
                        WHERE lt.lead_id = a.id AND t.name = $6
                    )) AS interested,
                (SELECT COUNT(*) FROM answered a
                    JOIN categories cat ON cat.id = a.category_id
                    WHERE cat.name = $7) AS not_interested
            "#,
        )
            .bind(agent_id)
            .bind(window.start)
            .bind(window.end)
            .bind(TAG_ANSWERED)
            .bind(CATEGORY_CONVERTED)
            .bind(TAG_INTERESTED)
            .bind(CATEGORY_NOT_INTERESTED)
            .fetch_one(executor)
            .await?;

        Ok(tally)
    }

    /// Resumo da organização para leads criados dentro da janela.
    pub async fn dashboard<'e, A>(
        &self,
        conn: A,
        organisation_id: Uuid,
        window: DateWindow,
    ) -> Result<DashboardSummary, AppError>
    where
        A: Acquire<'e, Database = Postgres>,
    {
        // Snapshot consistente entre as contagens
        let mut tx = conn.begin().await?;

        let (total, converted, uncategorised) = sqlx::query_as::<_, (i64, i64, i64)>(
            r#"
            SELECT
                COUNT(*),
                COUNT(*) FILTER (WHERE c.name = $4),
                COUNT(*) FILTER (WHERE l.category_id IS NULL)
            FROM leads l
            LEFT JOIN categories c ON c.id = l.category_id
            WHERE l.organisation_id = $1
              AND l.created_at::date BETWEEN $2 AND $3
            "#,
        )
            .bind(organisation_id)
            .bind(window.start)
            .bind(window.end)
            .bind(CATEGORY_CONVERTED)
            .fetch_one(&mut *tx)
            .await?;

        let counts = sqlx::query_as::<_, CategoryCount>(
            r#"
            SELECT c.name, COUNT(l.id) AS leads_count
            FROM categories c
            LEFT JOIN leads l
                ON l.category_id = c.id
               AND l.created_at::date BETWEEN $2 AND $3
            WHERE c.organisation_id = $1
            GROUP BY c.id, c.name
            ORDER BY c.name ASC
            "#,
        )
            .bind(organisation_id)
            .bind(window.start)
            .bind(window.end)
            .fetch_all(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(DashboardSummary::build(window, total, converted, uncategorised, counts))
    }
}
