pub mod charts;
pub mod config;
pub mod errors;
pub mod mailer;
pub mod models;
pub mod providers;
pub mod services;
pub mod storage;
pub mod util;

pub use config::{Config, MailConfig};
pub use errors::{Result, ReportError};
pub use models::index::TrackedIndex;
pub use models::window::{LookbackWindow, WindowSeries};
pub use services::{ReportService, RunOptions, RunOutcome};
