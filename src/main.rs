//src/main.rs

use anyhow::Context;
use axum::{
    middleware as axum_middleware,
    routing::{delete, get, post, put},
    Json, Router,
};
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;
use utoipa::OpenApi;

mod common;
mod config;
mod db;
mod docs;
mod handlers;
mod middleware;
mod models;
mod services;
#[cfg(test)]
mod test_support;

use crate::config::{AppState, Config};
use crate::docs::ApiDoc;
use crate::middleware::auth::auth_guard;
use crate::services::reminder_service::{spawn_reminder_dispatcher, spawn_reminder_log};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_target(false)
        .compact()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    // Se a configuração falhar, a aplicação não deve iniciar.
    let config = Config::from_env()?;
    let app_state = AppState::new(&config).await?;

    sqlx::migrate!()
        .run(&app_state.db_pool)
        .await
        .context("Falha ao rodar as migrações do banco de dados.")?;

    tracing::info!("✅ Migrações do banco de dados executadas com sucesso!");

    spawn_reminder_log(app_state.reminder_tx.subscribe());
    spawn_reminder_dispatcher(
        app_state.db_pool.clone(),
        app_state.reminder_service.clone(),
        app_state.reminder_tx.clone(),
        config.reminder_poll,
    );

    let app = router(app_state);

    let listener = TcpListener::bind(&config.bind_addr)
        .await
        .with_context(|| format!("Falha ao iniciar o listener TCP em {}", config.bind_addr))?;
    tracing::info!("🚀 Servidor escutando em {}", listener.local_addr()?);

    axum::serve(listener, app).await.context("Erro no servidor Axum")?;
    Ok(())
}

fn router(app_state: AppState) -> Router {
    let lead_routes = Router::new()
        .route("/", get(handlers::leads::list_leads))
        .route("/facets/{field}", get(handlers::leads::list_facet_choices))
        // Importação (lote já parseado)
        .route("/import", post(handlers::leads::import_unassigned))
        .route("/import/agents/{agent_id}", post(handlers::leads::import_to_agent))
        .route("/import/random", post(handlers::leads::import_randomly))
        // Ações em massa
        .route("/reassign", post(handlers::leads::reassign_selected))
        .route("/delete-selected", post(handlers::leads::delete_selected))
        // Por lead
        .route("/{lead_id}/call", post(handlers::leads::log_call))
        .route("/{lead_id}/follow-ups"
               ,post(handlers::reminders::create_follow_up)
               .get(handlers::reminders::list_follow_ups)
        );

    let agent_routes = Router::new()
        .route("/"
               ,post(handlers::agents::create_agent)
               .get(handlers::agents::list_agents)
        )
        .route("/{agent_id}", delete(handlers::agents::delete_agent))
        .route("/{agent_id}/permissions"
               ,get(handlers::permissions::list_agent_permissions)
               .put(handlers::permissions::replace_agent_permissions)
        );

    let permission_routes = Router::new()
        .route("/"
               ,post(handlers::permissions::create_permission)
               .get(handlers::permissions::list_permissions)
        )
        .route("/{permission_id}"
               ,put(handlers::permissions::update_permission)
               .delete(handlers::permissions::delete_permission)
        );

    let report_routes = Router::new()
        .route("/"
               ,post(handlers::sales_reports::create_sales_report)
               .get(handlers::sales_reports::list_sales_reports)
        )
        .route("/{report_id}", get(handlers::sales_reports::get_sales_report));

    let api = Router::new()
        .nest("/leads", lead_routes)
        .nest("/agents", agent_routes)
        .nest("/sales-reports", report_routes)
        .nest("/permissions", permission_routes)
        .route("/categories"
               ,post(handlers::agents::create_category)
               .get(handlers::agents::list_categories)
        )
        .route("/tags"
               ,post(handlers::agents::create_tag)
               .get(handlers::agents::list_tags)
        )
        .route("/stats", get(handlers::stats::agent_stats))
        .route("/stats/agents/{agent_id}", get(handlers::stats::single_agent_stats))
        .route("/dashboard", get(handlers::stats::dashboard))
        .route("/reminders", get(handlers::reminders::pending_reminders))
        .route("/reminders/due", get(handlers::reminders::due_reminders))
        // Tudo em /api exige bearer token
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            auth_guard,
        ));

    Router::new()
        .route("/api/health", get(|| async { "OK" }))
        .route("/api-docs/openapi.json", get(|| async { Json(ApiDoc::openapi()) }))
        .nest("/api", api)
        .with_state(app_state)
}
