use crate::errors::{ReportError, Result};
use crate::models::index::{default_indexes, TrackedIndex};
use chrono_tz::Tz;
use std::env;

pub const ENV_SMTP_HOST: &str = "INDEX_REPORT_SMTP_HOST";
pub const ENV_SMTP_PORT: &str = "INDEX_REPORT_SMTP_PORT";
pub const ENV_SMTP_USER: &str = "INDEX_REPORT_SMTP_USER";
pub const ENV_SMTP_PASSWORD: &str = "INDEX_REPORT_SMTP_PASSWORD";
pub const ENV_SENDER: &str = "INDEX_REPORT_SENDER";
pub const ENV_RECIPIENTS: &str = "INDEX_REPORT_RECIPIENTS";
pub const ENV_FONT: &str = "INDEX_REPORT_FONT";

/// Fonts tried in order when no font is configured explicitly.
pub const DEFAULT_FONT_PATHS: &[&str] = &[
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
    "/Library/Fonts/Arial.ttf",
    "/System/Library/Fonts/Supplemental/Arial.ttf",
    "C:\\Windows\\Fonts\\arial.ttf",
];

/// SMTP submission settings. Credentials and addresses are supplied at
/// runtime, never compiled in.
#[derive(Debug, Clone)]
pub struct MailConfig {
    pub smtp_host: String,
    pub smtp_port: u16,
    pub username: String,
    pub password: String,
    pub sender: String,
    pub recipients: Vec<String>,
}

impl MailConfig {
    pub fn new() -> Self {
        Self {
            smtp_host: "smtp.gmail.com".to_string(),
            smtp_port: 587,
            username: String::new(),
            password: String::new(),
            sender: String::new(),
            recipients: Vec::new(),
        }
    }

    /// Reads host, credentials and addresses from `INDEX_REPORT_*` variables.
    pub fn from_env() -> Result<Self> {
        let mut config = Self::new();

        if let Ok(host) = env::var(ENV_SMTP_HOST) {
            config.smtp_host = host;
        }
        if let Ok(port) = env::var(ENV_SMTP_PORT) {
            config.smtp_port = port.trim().parse::<u16>().map_err(|e| {
                ReportError::ConfigError(format!("{} is not a valid port: {}", ENV_SMTP_PORT, e))
            })?;
        }

        config.username = env::var(ENV_SMTP_USER).unwrap_or_default();
        config.password = env::var(ENV_SMTP_PASSWORD).unwrap_or_default();
        config.sender = env::var(ENV_SENDER).unwrap_or_else(|_| config.username.clone());
        config.recipients = env::var(ENV_RECIPIENTS)
            .map(|list| parse_recipients(&list))
            .unwrap_or_default();

        Ok(config)
    }

    pub fn with_credentials(mut self, username: &str, password: &str) -> Self {
        self.username = username.to_string();
        self.password = password.to_string();
        self
    }

    pub fn with_sender(mut self, sender: &str) -> Self {
        self.sender = sender.to_string();
        self
    }

    pub fn with_recipients(mut self, recipients: &[&str]) -> Self {
        self.recipients = recipients.iter().map(|r| r.to_string()).collect();
        self
    }

    /// Checks that everything needed to submit a message is present.
    pub fn validate(&self) -> Result<()> {
        if self.username.is_empty() {
            return Err(ReportError::ConfigError(format!("{} is not set", ENV_SMTP_USER)));
        }
        if self.password.is_empty() {
            return Err(ReportError::ConfigError(format!("{} is not set", ENV_SMTP_PASSWORD)));
        }
        if self.sender.is_empty() {
            return Err(ReportError::ConfigError(format!("{} is not set", ENV_SENDER)));
        }
        if self.recipients.is_empty() {
            return Err(ReportError::ConfigError(format!("{} is not set", ENV_RECIPIENTS)));
        }
        Ok(())
    }
}

/// Splits a comma separated recipient list, dropping blanks.
pub fn parse_recipients(list: &str) -> Vec<String> {
    list.split(',')
        .map(|r| r.trim())
        .filter(|r| !r.is_empty())
        .map(|r| r.to_string())
        .collect()
}

#[derive(Debug, Clone)]
pub struct ChartConfig {
    pub width: u32,
    pub height: u32,
    pub font_path: Option<String>,
}

impl ChartConfig {
    pub fn new() -> Self {
        Self {
            width: 2000,
            height: 2000,
            font_path: env::var(ENV_FONT).ok(),
        }
    }
}

pub struct Config {
    pub indexes: Vec<TrackedIndex>,
    pub data_dir: String,
    pub output_dir: String,
    pub market_timezone: Tz,
    pub chart: ChartConfig,
    pub mail: MailConfig,
}

impl Config {
    pub fn new() -> Self {
        Self {
            indexes: default_indexes(),
            data_dir: "data".to_string(),
            output_dir: "output".to_string(),
            market_timezone: chrono_tz::America::New_York,
            chart: ChartConfig::new(),
            mail: MailConfig::new(),
        }
    }

    pub fn with_indexes(mut self, indexes: Vec<TrackedIndex>) -> Self {
        self.indexes = indexes;
        self
    }

    pub fn with_data_dir(mut self, dir: &str) -> Self {
        self.data_dir = dir.to_string();
        self
    }

    pub fn with_output_dir(mut self, dir: &str) -> Self {
        self.output_dir = dir.to_string();
        self
    }

    pub fn with_font_path(mut self, path: &str) -> Self {
        self.chart.font_path = Some(path.to_string());
        self
    }

    pub fn with_mail(mut self, mail: MailConfig) -> Self {
        self.mail = mail;
        self
    }

    /// The index whose trade date decides whether today is a trading day.
    pub fn guard_index(&self) -> Option<&TrackedIndex> {
        self.indexes.first()
    }
}
