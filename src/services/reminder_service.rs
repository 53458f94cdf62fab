// src/services/reminder_service.rs

use std::{borrow::Cow, time::Duration};

use chrono::{DateTime, Utc};
use sqlx::{Acquire, Executor, PgPool, Postgres};
use tokio::{sync::broadcast, task::JoinHandle};
use uuid::Uuid;
use validator::{ValidationError, ValidationErrors};

use crate::{
    common::error::AppError,
    db::{LeadRepository, ScheduleRepository},
    models::lead::LeadScope,
    models::schedule::{
        CreateFollowUpPayload, FollowUp, FollowUpCreated, ReminderEvent, ReminderNotification,
        ReminderPayload,
    },
};

/// Lembrete para um dia que já passou é recusado.
pub fn ensure_not_past(reminder: &ReminderPayload, now: DateTime<Utc>) -> Result<(), AppError> {
    if reminder.date < now.date_naive() {
        let mut error = ValidationError::new("past_date");
        error.message = Some(Cow::from("A data do lembrete não pode estar no passado."));

        let mut errors = ValidationErrors::new();
        errors.add("date", error);
        return Err(AppError::ValidationError(errors));
    }
    Ok(())
}

#[derive(Clone)]
pub struct ReminderService {
    schedules: ScheduleRepository,
    leads: LeadRepository,
}

impl ReminderService {
    pub fn new(schedules: ScheduleRepository, leads: LeadRepository) -> Self {
        Self { schedules, leads }
    }

    /// Nota de acompanhamento; com lembrete, cria agenda e notificação na mesma transação.
    pub async fn create_follow_up<'e, A>(
        &self,
        conn: A,
        scope: LeadScope,
        author_id: Uuid,
        lead_id: Uuid,
        payload: &CreateFollowUpPayload,
    ) -> Result<FollowUpCreated, AppError>
    where
        A: Acquire<'e, Database = Postgres>,
    {
        if let Some(reminder) = &payload.reminder {
            ensure_not_past(reminder, Utc::now())?;
        }

        let mut tx = conn.begin().await?;

        self.leads
            .find_in_scope(&mut *tx, scope, lead_id)
            .await?
            .ok_or(AppError::NotFound("Lead"))?;

        let follow_up = self
            .schedules
            .create_follow_up(&mut *tx, lead_id, author_id, &payload.notes)
            .await?;

        let (schedule, reminder) = match &payload.reminder {
            Some(r) => {
                let schedule = self.schedules.create_schedule(&mut *tx, lead_id, r).await?;
                let reminder = self
                    .schedules
                    .create_reminder(&mut *tx, author_id, lead_id, &r.title, r.reminder_on())
                    .await?;
                (Some(schedule), Some(reminder))
            }
            None => (None, None),
        };

        tx.commit().await?;

        if let Some(r) = &reminder {
            tracing::info!("⏰ Lembrete agendado para {}", r.reminder_on);
        }

        Ok(FollowUpCreated { follow_up, schedule, reminder })
    }

    pub async fn list_follow_ups<'e, A>(
        &self,
        conn: A,
        scope: LeadScope,
        lead_id: Uuid,
    ) -> Result<Vec<FollowUp>, AppError>
    where
        A: Acquire<'e, Database = Postgres>,
    {
        let mut conn = conn.acquire().await?;

        self.leads
            .find_in_scope(&mut *conn, scope, lead_id)
            .await?
            .ok_or(AppError::NotFound("Lead"))?;

        self.schedules.list_follow_ups(&mut *conn, lead_id).await
    }

    pub async fn pending_reminders<'e, E>(
        &self,
        executor: E,
        user_id: Uuid,
    ) -> Result<Vec<ReminderNotification>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        self.schedules.pending_for_user(executor, user_id).await
    }

    /// Lembretes que já venceram, inclusive os já disparados.
    pub async fn due_reminders<'e, E>(
        &self,
        executor: E,
        user_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<Vec<ReminderNotification>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        self.schedules.due_for_user(executor, user_id, now).await
    }

    /// Reivindica os lembretes vencidos e publica cada um uma única vez.
    pub async fn dispatch_due<'e, E>(
        &self,
        executor: E,
        sender: &broadcast::Sender<ReminderEvent>,
    ) -> Result<usize, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let due = self.schedules.claim_due_reminders(executor, Utc::now()).await?;
        Ok(publish(sender, due))
    }
}

/// Sem assinantes o evento se perde; o lembrete continua marcado como enviado.
pub fn publish(sender: &broadcast::Sender<ReminderEvent>, due: Vec<ReminderNotification>) -> usize {
    let total = due.len();

    for reminder in due {
        let id = reminder.id;
        if sender.send(ReminderEvent::from(reminder)).is_err() {
            tracing::warn!("⚠️ Lembrete {} disparado sem nenhum assinante", id);
        }
    }

    total
}

/// Ouvinte do próprio processo: registra cada lembrete entregue. Termina quando o canal fecha.
pub fn spawn_reminder_log(mut receiver: broadcast::Receiver<ReminderEvent>) -> JoinHandle<u64> {
    tokio::spawn(async move {
        let mut delivered = 0;
        loop {
            match receiver.recv().await {
                Ok(event) => {
                    delivered += 1;
                    tracing::info!("🔔 Lembrete para {} (lead {}): {}", event.user_id, event.lead_id, event.message);
                }
                Err(broadcast::error::RecvError::Lagged(lost)) => {
                    tracing::warn!("⚠️ Ouvinte de lembretes atrasado, {} eventos perdidos", lost);
                }
                Err(broadcast::error::RecvError::Closed) => break delivered,
            }
        }
    })
}

pub fn spawn_reminder_dispatcher(
    pool: PgPool,
    service: ReminderService,
    sender: broadcast::Sender<ReminderEvent>,
    every: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(every);
        loop {
            interval.tick().await;
            match service.dispatch_due(&pool, &sender).await {
                Ok(0) => {}
                Ok(n) => tracing::info!("🔔 {} lembretes disparados", n),
                Err(e) => tracing::error!("🔥 Falha ao disparar lembretes: {:?}", e),
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, NaiveTime, TimeZone};

    use crate::test_support as ts;

    fn reminder(date: NaiveDate) -> ReminderPayload {
        ReminderPayload {
            title: "Ligar de novo".to_string(),
            date,
            time: NaiveTime::from_hms_opt(9, 30, 0).unwrap(),
        }
    }

    fn notification(message: &str) -> ReminderNotification {
        ReminderNotification {
            id: Uuid::new_v4(),
            user_id: Uuid::from_u128(1),
            lead_id: Uuid::from_u128(2),
            message: message.to_string(),
            reminder_on: Utc::now(),
            sent: true,
        }
    }

    #[test]
    fn reminder_for_yesterday_is_rejected() {
        let now = Utc.with_ymd_and_hms(2024, 6, 10, 12, 0, 0).unwrap();
        let err = ensure_not_past(&reminder(NaiveDate::from_ymd_opt(2024, 6, 9).unwrap()), now).unwrap_err();

        match err {
            AppError::ValidationError(errors) => assert!(errors.field_errors().contains_key("date")),
            other => panic!("erro inesperado: {:?}", other),
        }
    }

    #[test]
    fn reminder_for_today_or_later_is_accepted() {
        let now = Utc.with_ymd_and_hms(2024, 6, 10, 12, 0, 0).unwrap();
        assert!(ensure_not_past(&reminder(NaiveDate::from_ymd_opt(2024, 6, 10).unwrap()), now).is_ok());
        assert!(ensure_not_past(&reminder(NaiveDate::from_ymd_opt(2024, 7, 1).unwrap()), now).is_ok());
    }

    #[test]
    fn reminder_time_is_taken_as_utc() {
        let r = reminder(NaiveDate::from_ymd_opt(2024, 6, 10).unwrap());
        assert_eq!(r.reminder_on(), Utc.with_ymd_and_hms(2024, 6, 10, 9, 30, 0).unwrap());
    }

    #[tokio::test]
    async fn publish_delivers_each_reminder_once() {
        let (sender, mut receiver) = broadcast::channel(8);
        let due = vec![notification("primeiro"), notification("segundo")];

        assert_eq!(publish(&sender, due), 2);
        assert_eq!(receiver.recv().await.unwrap().message, "primeiro");
        assert_eq!(receiver.recv().await.unwrap().message, "segundo");
        assert!(receiver.try_recv().is_err());
    }

    #[tokio::test]
    async fn publish_without_subscribers_still_counts() {
        let (sender, receiver) = broadcast::channel::<ReminderEvent>(8);
        drop(receiver);

        assert_eq!(publish(&sender, vec![notification("ninguém ouvindo")]), 1);
    }

    #[tokio::test]
    async fn reminder_log_consumes_until_the_channel_closes() {
        let (sender, receiver) = broadcast::channel(8);
        let listener = spawn_reminder_log(receiver);

        publish(&sender, vec![notification("um"), notification("dois")]);
        drop(sender);

        assert_eq!(listener.await.unwrap(), 2);
    }

    #[sqlx::test]
    async fn due_inbox_keeps_reminders_after_dispatch(pool: PgPool) {
        let org = ts::organisation(&pool).await;
        let ana = ts::agent(&pool, org, "Ana").await;
        let lead_id = ts::lead(&pool, org, Some(ana.id), "01").await;

        let schedules = ScheduleRepository::new();
        let service = ReminderService::new(schedules.clone(), LeadRepository::new());
        let now = Utc::now();

        let past = schedules
            .create_reminder(&pool, ana.user_id, lead_id, "ligar de novo", now - chrono::Duration::hours(1))
            .await
            .unwrap();
        let future = schedules
            .create_reminder(&pool, ana.user_id, lead_id, "amanhã", now + chrono::Duration::days(1))
            .await
            .unwrap();
        // Outro usuário não aparece
        schedules
            .create_reminder(&pool, Uuid::new_v4(), lead_id, "de outro", now - chrono::Duration::hours(1))
            .await
            .unwrap();

        let due = service.due_reminders(&pool, ana.user_id, now).await.unwrap();
        assert_eq!(due.iter().map(|r| r.id).collect::<Vec<_>>(), vec![past.id]);
        assert!(!due[0].sent);
        assert_eq!(service.pending_reminders(&pool, ana.user_id).await.unwrap().len(), 2);

        let (sender, mut receiver) = broadcast::channel(8);
        assert_eq!(service.dispatch_due(&pool, &sender).await.unwrap(), 2);
        assert!(receiver.recv().await.is_ok());
        assert!(receiver.recv().await.is_ok());

        let due = service.due_reminders(&pool, ana.user_id, now).await.unwrap();
        assert_eq!(due.len(), 1);
        assert_eq!(due[0].id, past.id);
        assert!(due[0].sent);

        let pending = service.pending_reminders(&pool, ana.user_id).await.unwrap();
        assert_eq!(pending.iter().map(|r| r.id).collect::<Vec<_>>(), vec![future.id]);

        // Já reivindicados não voltam a disparar
        assert_eq!(service.dispatch_due(&pool, &sender).await.unwrap(), 0);
    }
}
