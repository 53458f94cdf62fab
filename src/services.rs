pub mod agent_service;
pub mod assignment_service;
pub mod lead_service;
pub mod permission_service;
pub mod reminder_service;
pub mod sales_report_service;
pub mod stats_service;
