// src/test_support.rs
//
// Dados mínimos para os testes que rodam contra o Postgres (#[sqlx::test]).
// Cada teste recebe um banco novo com as migrações aplicadas; DATABASE_URL deve apontar
// para um servidor onde o usuário pode criar bancos.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    db::AgentRepository,
    models::{agent::Agent, lead::ImportRow, lead::LeadScope},
};

// =============================================================================
//  CADASTROS
// =============================================================================

pub async fn organisation(pool: &PgPool) -> Uuid {
    sqlx::query_scalar("INSERT INTO organisations (name) VALUES ('Acme') RETURNING id")
        .fetch_one(pool)
        .await
        .unwrap()
}

pub async fn agent(pool: &PgPool, organisation_id: Uuid, first_name: &str) -> Agent {
    AgentRepository::new()
        .create_agent(pool, organisation_id, Uuid::new_v4(), first_name, "Teste")
        .await
        .unwrap()
}

pub async fn category(pool: &PgPool, organisation_id: Uuid, name: &str) -> Uuid {
    sqlx::query_scalar("INSERT INTO categories (organisation_id, name) VALUES ($1, $2) RETURNING id")
        .bind(organisation_id)
        .bind(name)
        .fetch_one(pool)
        .await
        .unwrap()
}

pub async fn tag(pool: &PgPool, name: &str) -> Uuid {
    sqlx::query_scalar("INSERT INTO tags (name) VALUES ($1) RETURNING id")
        .bind(name)
        .fetch_one(pool)
        .await
        .unwrap()
}

pub fn org_scope(organisation_id: Uuid) -> LeadScope {
    LeadScope { organisation_id, agent_id: None }
}

// =============================================================================
//  LEADS
// =============================================================================

pub fn row(phone: &str) -> ImportRow {
    ImportRow {
        phone_number: phone.to_string(),
        first_name: "Lead".to_string(),
        last_name: phone.to_string(),
        source: "facebook".to_string(),
        service: String::new(),
        email: String::new(),
        country: String::new(),
        campaign: String::new(),
    }
}

pub fn rows(phones: &[&str]) -> Vec<ImportRow> {
    phones.iter().map(|p| row(p)).collect()
}

pub async fn lead(pool: &PgPool, organisation_id: Uuid, agent_id: Option<Uuid>, phone: &str) -> Uuid {
    sqlx::query_scalar(
        r#"
        INSERT INTO leads (organisation_id, agent_id, first_name, last_name, phone_number)
        VALUES ($1, $2, 'Lead', $3, $3)
        RETURNING id
        "#,
    )
        .bind(organisation_id)
        .bind(agent_id)
        .bind(phone)
        .fetch_one(pool)
        .await
        .unwrap()
}

pub async fn called_at(pool: &PgPool, lead_id: Uuid, at: DateTime<Utc>) {
    sqlx::query("UPDATE leads SET last_called = $2 WHERE id = $1")
        .bind(lead_id)
        .bind(at)
        .execute(pool)
        .await
        .unwrap();
}

pub async fn categorise(pool: &PgPool, lead_id: Uuid, category_id: Uuid) {
    sqlx::query("UPDATE leads SET category_id = $2 WHERE id = $1")
        .bind(lead_id)
        .bind(category_id)
        .execute(pool)
        .await
        .unwrap();
}

pub async fn tag_lead(pool: &PgPool, lead_id: Uuid, tag_id: Uuid) {
    sqlx::query("INSERT INTO lead_tags (lead_id, tag_id) VALUES ($1, $2)")
        .bind(lead_id)
        .bind(tag_id)
        .execute(pool)
        .await
        .unwrap();
}

/// Telefones dos leads de cada agente, na ordem do telefone.
pub async fn phones_of(pool: &PgPool, agent_id: Uuid) -> Vec<String> {
    sqlx::query_scalar("SELECT phone_number FROM leads WHERE agent_id = $1 ORDER BY phone_number ASC")
        .bind(agent_id)
        .fetch_all(pool)
        .await
        .unwrap()
}

pub async fn agent_of(pool: &PgPool, lead_id: Uuid) -> Option<Uuid> {
    sqlx::query_scalar("SELECT agent_id FROM leads WHERE id = $1")
        .bind(lead_id)
        .fetch_one(pool)
        .await
        .unwrap()
}
