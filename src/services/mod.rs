pub mod report_service;
pub mod selector;

pub use report_service::{ReportService, RunOptions, RunOutcome};
