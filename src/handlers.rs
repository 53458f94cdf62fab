pub mod agents;
pub mod leads;
pub mod permissions;
pub mod reminders;
pub mod sales_reports;
pub mod stats;
