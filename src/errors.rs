use thiserror::Error;

#[derive(Error, Debug)]
pub enum ReportError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("HTTP request error: {0}")]
    RequestError(#[from] reqwest::Error),

    #[error("JSON parsing error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("Date parsing error: {0}")]
    DateError(#[from] chrono::ParseError),

    #[error("Provider error: {0}")]
    ProviderError(String),

    #[error("Chart error: {0}")]
    ChartError(String),

    #[error("Mail error: {0}")]
    MailError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Data error: {0}")]
    DataError(String),
}

pub type Result<T> = std::result::Result<T, ReportError>;

impl From<lettre::error::Error> for ReportError {
    fn from(e: lettre::error::Error) -> Self {
        ReportError::MailError(e.to_string())
    }
}

impl From<lettre::address::AddressError> for ReportError {
    fn from(e: lettre::address::AddressError) -> Self {
        ReportError::ConfigError(e.to_string())
    }
}

impl From<lettre::transport::smtp::Error> for ReportError {
    fn from(e: lettre::transport::smtp::Error) -> Self {
        ReportError::MailError(e.to_string())
    }
}

impl From<image::ImageError> for ReportError {
    fn from(e: image::ImageError) -> Self {
        ReportError::ChartError(e.to_string())
    }
}
