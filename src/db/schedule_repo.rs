// src/db/schedule_repo.rs

use chrono::{DateTime, Utc};
use sqlx::{Executor, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::schedule::{FollowUp, ReminderNotification, ReminderPayload, Schedule},
};

#[derive(Clone, Default)]
pub struct ScheduleRepository;

impl ScheduleRepository {
    pub fn new() -> Self {
        Self
    }

    // =========================================================================
    //  FOLLOW-UPS
    // =========================================================================

    pub async fn create_follow_up<'e, E>(
        &self,
        executor: E,
        lead_id: Uuid,
        author_id: Uuid,
        notes: &str,
    ) -> Result<FollowUp, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let follow_up = sqlx::query_as::<_, FollowUp>(
            r#"
            INSERT INTO follow_ups (lead_id, author_id, notes)
            VALUES ($1, $2, $3)
            RETURNING id, lead_id, author_id, notes, created_at
            "#,
        )
            .bind(lead_id)
            .bind(author_id)
            .bind(notes)
            .fetch_one(executor)
            .await?;

        Ok(follow_up)
    }

    pub async fn list_follow_ups<'e, E>(&self, executor: E, lead_id: Uuid) -> Result<Vec<FollowUp>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let follow_ups = sqlx::query_as::<_, FollowUp>(
            r#"
            SELECT id, lead_id, author_id, notes, created_at
            FROM follow_ups
            WHERE lead_id = $1
            ORDER BY created_at DESC
            "#,
        )
            .bind(lead_id)
            .fetch_all(executor)
            .await?;

        Ok(follow_ups)
    }

    // =========================================================================
    //  AGENDA E LEMBRETES
    // =========================================================================

    pub async fn create_schedule<'e, E>(
        &self,
        executor: E,
        lead_id: Uuid,
        reminder: &ReminderPayload,
    ) -> Result<Schedule, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let schedule = sqlx::query_as::<_, Schedule>(
            r#"
            INSERT INTO schedules (lead_id, title, date, time)
            VALUES ($1, $2, $3, $4)
            RETURNING id, lead_id, title, date, time
            "#,
        )
            .bind(lead_id)
            .bind(&reminder.title)
            .bind(reminder.date)
            .bind(reminder.time)
            .fetch_one(executor)
            .await?;

        Ok(schedule)
    }

    pub async fn create_reminder<'e, E>(
        &self,
        executor: E,
        user_id: Uuid,
        lead_id: Uuid,
        message: &str,
        reminder_on: DateTime<Utc>,
    ) -> Result<ReminderNotification, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let reminder = sqlx::query_as::<_, ReminderNotification>(
            r#"
            INSERT INTO reminder_notifications (user_id, lead_id, message, reminder_on)
            VALUES ($1, $2, $3, $4)
            RETURNING id, user_id, lead_id, message, reminder_on, sent
            "#,
        )
            .bind(user_id)
            .bind(lead_id)
            .bind(message)
            .bind(reminder_on)
            .fetch_one(executor)
            .await?;

        Ok(reminder)
    }

    /// Marca como enviados e devolve, numa única instrução, os lembretes vencidos.
    /// Duas instâncias concorrentes nunca pegam o mesmo lembrete.
    pub async fn claim_due_reminders<'e, E>(
        &self,
        executor: E,
        now: DateTime<Utc>,
    ) -> Result<Vec<ReminderNotification>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let due = sqlx::query_as::<_, ReminderNotification>(
            r#"
            UPDATE reminder_notifications r
            SET sent = TRUE
            WHERE r.id IN (
                SELECT id FROM reminder_notifications
                WHERE sent = FALSE AND reminder_on <= $1
                ORDER BY reminder_on ASC
                FOR UPDATE SKIP LOCKED
            )
            RETURNING r.id, r.user_id, r.lead_id, r.message, r.reminder_on, r.sent
            "#,
        )
            .bind(now)
            .fetch_all(executor)
            .await?;

        Ok(due)
    }

    pub async fn pending_for_user<'e, E>(
        &self,
        executor: E,
        user_id: Uuid,
    ) -> Result<Vec<ReminderNotification>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let pending = sqlx::query_as::<_, ReminderNotification>(
            r#"
            SELECT id, user_id, lead_id, message, reminder_on, sent
            FROM reminder_notifications
            WHERE user_id = $1 AND sent = FALSE
            ORDER BY reminder_on DESC
            "#,
        )
            .bind(user_id)
            .fetch_all(executor)
            .await?;

        Ok(pending)
    }

    /// Caixa de notificações: lembretes do usuário cujo horário já chegou, disparados ou não.
    pub async fn due_for_user<'e, E>(
        &self,
        executor: E,
        user_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<Vec<ReminderNotification>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let due = sqlx::query_as::<_, ReminderNotification>(
            r#"
            SELECT id, user_id, lead_id, message, reminder_on, sent
            FROM reminder_notifications
            WHERE user_id = $1 AND reminder_on <= $2
            ORDER BY reminder_on DESC
            "#,
        )
            .bind(user_id)
            .bind(now)
            .fetch_all(executor)
            .await?;

        Ok(due)
    }
}
