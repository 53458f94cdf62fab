// src/docs.rs

use utoipa::OpenApi;
use utoipa::openapi::security::{Http, HttpAuthScheme, SecurityScheme};
use crate::handlers;
use crate::models;
use crate::common;

#[derive(OpenApi)]
#[openapi(
    paths(
        // --- Leads ---
        handlers::leads::list_leads,
        handlers::leads::list_facet_choices,
        handlers::leads::import_unassigned,
        handlers::leads::import_to_agent,
        handlers::leads::import_randomly,
        handlers::leads::reassign_selected,
        handlers::leads::delete_selected,
        handlers::leads::log_call,

        // --- Agents / Taxonomy ---
        handlers::agents::create_agent,
        handlers::agents::list_agents,
        handlers::agents::delete_agent,
        handlers::agents::create_category,
        handlers::agents::list_categories,
        handlers::agents::create_tag,
        handlers::agents::list_tags,

        // --- Permissions ---
        handlers::permissions::create_permission,
        handlers::permissions::list_permissions,
        handlers::permissions::update_permission,
        handlers::permissions::delete_permission,
        handlers::permissions::list_agent_permissions,
        handlers::permissions::replace_agent_permissions,

        // --- Stats ---
        handlers::stats::agent_stats,
        handlers::stats::single_agent_stats,
        handlers::stats::dashboard,

        // --- Sales Reports ---
        handlers::sales_reports::create_sales_report,
        handlers::sales_reports::list_sales_reports,
        handlers::sales_reports::get_sales_report,

        // --- Follow-ups ---
        handlers::reminders::create_follow_up,
        handlers::reminders::list_follow_ups,
        handlers::reminders::pending_reminders,
        handlers::reminders::due_reminders,
    ),
    components(
        schemas(
            // --- Leads ---
            models::lead::LeadRow,
            models::lead::LeadPage,
            models::lead::ImportRow,
            models::lead::ImportSummary,
            models::lead::ReassignSummary,
            models::lead::FacetChoice,
            models::lead::LogCallPayload,
            handlers::leads::ReassignPayload,
            handlers::leads::DeleteSelectedPayload,

            // --- Agents / Taxonomy ---
            models::agent::Agent,
            models::agent::CreateAgentPayload,
            models::agent::Category,
            models::agent::Tag,
            models::agent::NamePayload,

            // --- Permissions ---
            models::permission::Permission,
            models::permission::PermissionPayload,
            models::permission::GrantPermissionsPayload,

            // --- Stats ---
            common::dates::DateWindow,
            models::stats::Rate,
            models::stats::AgentStats,
            models::stats::StatsReport,
            models::stats::CategoryShare,
            models::stats::DashboardSummary,

            // --- Sales Reports ---
            models::sales_report::SalesReport,
            models::sales_report::CreateSalesReportPayload,

            // --- Follow-ups ---
            models::schedule::FollowUp,
            models::schedule::Schedule,
            models::schedule::ReminderNotification,
            models::schedule::ReminderPayload,
            models::schedule::CreateFollowUpPayload,
            models::schedule::FollowUpCreated,
            models::schedule::ReminderEvent,
        )
    ),
    tags(
        (name = "Leads", description = "Busca, importação, atribuição e ligações"),
        (name = "Agents", description = "Agentes da organização"),
        (name = "Taxonomy", description = "Categorias e tags"),
        (name = "Permissions", description = "Catálogo de permissões e concessões aos agentes"),
        (name = "Stats", description = "Estatísticas por agente e dashboard"),
        (name = "Sales Reports", description = "Avaliações mensais dos agentes"),
        (name = "Follow-ups", description = "Acompanhamentos e lembretes")
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "api_jwt",
            SecurityScheme::Http(
                Http::new(HttpAuthScheme::Bearer)
            ),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_route_is_documented() {
        let doc = ApiDoc::openapi();
        let paths: Vec<&String> = doc.paths.paths.keys().collect();

        for expected in [
            "/api/leads",
            "/api/leads/import/random",
            "/api/leads/{lead_id}/call",
            "/api/stats",
            "/api/permissions/{permission_id}",
            "/api/agents/{agent_id}/permissions",
            "/api/dashboard",
            "/api/sales-reports/{report_id}",
            "/api/reminders",
            "/api/reminders/due",
        ] {
            assert!(paths.iter().any(|p| p.as_str() == expected), "faltando {}", expected);
        }
    }
}
