pub mod agent;
pub mod auth;
pub mod lead;
pub mod permission;
pub mod sales_report;
pub mod schedule;
pub mod stats;
