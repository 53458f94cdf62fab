pub mod lead_repo;
pub use lead_repo::LeadRepository;
pub mod agent_repo;
pub use agent_repo::AgentRepository;
pub mod stats_repo;
pub use stats_repo::StatsRepository;
pub mod sales_report_repo;
pub use sales_report_repo::SalesReportRepository;
pub mod permission_repo;
pub use permission_repo::PermissionRepository;
pub mod schedule_repo;
pub use schedule_repo::ScheduleRepository;
