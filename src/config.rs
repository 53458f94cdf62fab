// src/config.rs

use std::{env, time::Duration};

use anyhow::Context;
use sqlx::{postgres::PgPoolOptions, PgPool};
use tokio::sync::broadcast;

use crate::{
    db::{
        AgentRepository, LeadRepository, PermissionRepository, SalesReportRepository, ScheduleRepository,
        StatsRepository,
    },
    models::schedule::ReminderEvent,
    services::{
        agent_service::AgentService, assignment_service::AssignmentService, lead_service::LeadService,
        permission_service::PermissionService, reminder_service::ReminderService, sales_report_service::SalesReportService,
        stats_service::StatsService,
    },
};

/// Configuração lida do ambiente (com `.env` opcional).
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    pub bind_addr: String,
    pub max_connections: u32,
    pub reminder_poll: Duration,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let database_url = env::var("DATABASE_URL").context("DATABASE_URL deve ser definida")?;
        let jwt_secret = env::var("JWT_SECRET").context("JWT_SECRET deve ser definido")?;
        let bind_addr = env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_string());

        let max_connections = parse_or("DATABASE_MAX_CONNECTIONS", 5)?;
        let poll_seconds: u64 = parse_or("REMINDER_POLL_SECONDS", 30)?;

        Ok(Self {
            database_url,
            jwt_secret,
            bind_addr,
            max_connections,
            reminder_poll: Duration::from_secs(poll_seconds.max(1)),
        })
    }
}

fn parse_or<T>(key: &str, default: T) -> anyhow::Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(key) {
        Ok(raw) => raw.trim().parse().with_context(|| format!("{} inválido: {}", key, raw)),
        Err(_) => Ok(default),
    }
}

#[derive(Clone)]
pub struct AppState {
    pub db_pool: PgPool,
    pub jwt_secret: String,
    pub agent_service: AgentService,
    pub assignment_service: AssignmentService,
    pub lead_service: LeadService,
    pub permission_service: PermissionService,
    pub stats_service: StatsService,
    pub sales_report_service: SalesReportService,
    pub reminder_service: ReminderService,
    pub reminder_tx: broadcast::Sender<ReminderEvent>,
}

impl AppState {
    pub async fn new(config: &Config) -> anyhow::Result<Self> {
        let db_pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_secs(3))
            .connect(&config.database_url)
            .await
            .context("Falha ao conectar ao banco de dados")?;

        tracing::info!("✅ Conexão com o banco de dados estabelecida com sucesso!");

        Ok(Self::with_pool(db_pool, config.jwt_secret.clone()))
    }

    // --- Monta o gráfico de dependências ---
    pub fn with_pool(db_pool: PgPool, jwt_secret: String) -> Self {
        let leads = LeadRepository::new();
        let agents = AgentRepository::new();
        let (reminder_tx, _) = broadcast::channel(256);

        Self {
            db_pool,
            jwt_secret,
            agent_service: AgentService::new(agents.clone()),
            assignment_service: AssignmentService::new(leads.clone(), agents.clone()),
            lead_service: LeadService::new(leads.clone()),
            permission_service: PermissionService::new(PermissionRepository::new(), agents.clone()),
            stats_service: StatsService::new(StatsRepository::new(), agents.clone()),
            sales_report_service: SalesReportService::new(SalesReportRepository::new(), agents),
            reminder_service: ReminderService::new(ScheduleRepository::new(), leads),
            reminder_tx,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numeric_settings_fall_back_to_defaults() {
        assert_eq!(parse_or::<u32>("LEADFLOW_TEST_UNSET_VARIABLE", 5).unwrap(), 5);
    }
}
