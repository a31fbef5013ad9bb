pub mod smtp;

use crate::config::MailConfig;
use crate::errors::{Result, ReportError};
use crate::models::report::Report;
use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::message::{Attachment, Mailbox, MultiPart, SinglePart};
use lettre::Message;

pub use smtp::SmtpMailer;

pub const REPORT_BODY: &str = "Daily Report";

/// Delivers a finished report
#[async_trait]
pub trait Mailer {
    async fn send_report(&self, report: &Report) -> Result<()>;
}

/// Build the report email: plain-text body plus one PNG attachment per index.
pub fn compose_message(config: &MailConfig, report: &Report) -> Result<Message> {
    let mut builder = Message::builder()
        .from(config.sender.parse::<Mailbox>()?)
        .subject(report.subject());

    for recipient in &config.recipients {
        builder = builder.to(recipient.parse::<Mailbox>()?);
    }

    let png_type = ContentType::parse("image/png")
        .map_err(|e| ReportError::MailError(e.to_string()))?;

    let mut parts = MultiPart::mixed().singlepart(SinglePart::plain(REPORT_BODY.to_string()));
    for chart in &report.charts {
        parts = parts.singlepart(
            Attachment::new(chart.attachment_name()).body(chart.png.clone(), png_type.clone()),
        );
    }

    Ok(builder.multipart(parts)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::report::IndexChart;
    use chrono::NaiveDate;

    fn mail_config() -> MailConfig {
        MailConfig::new()
            .with_credentials("reporter@example.com", "secret")
            .with_sender("reporter@example.com")
            .with_recipients(&["one@example.com", "two@example.com"])
    }

    fn report() -> Report {
        let mut report = Report::new(NaiveDate::from_ymd_opt(2021, 6, 1).unwrap());
        for (symbol, name) in [("^IXIC", "NASDAQ"), ("^DJI", "DOW")] {
            report.charts.push(IndexChart {
                symbol: symbol.to_string(),
                display_name: name.to_string(),
                png: b"\x89PNG fake".to_vec(),
            });
        }
        report
    }

    #[test]
    fn message_has_subject_body_and_one_attachment_per_index() {
        let message = compose_message(&mail_config(), &report()).unwrap();
        let raw = String::from_utf8_lossy(&message.formatted()).into_owned();

        assert!(raw.contains("Subject: Stock Market Index Report for 2021-06-01"));
        assert!(raw.contains(REPORT_BODY));
        // Filenames may be RFC 2231 escaped, so match past the caret.
        assert!(raw.contains("IXIC.png"));
        assert!(raw.contains("DJI.png"));
        assert_eq!(raw.matches("Content-Type: image/png").count(), 2);
    }

    #[test]
    fn every_recipient_is_on_the_envelope() {
        let message = compose_message(&mail_config(), &report()).unwrap();
        assert_eq!(message.envelope().to().len(), 2);
    }

    #[test]
    fn bad_address_is_rejected() {
        let config = mail_config().with_recipients(&["not an address"]);
        assert!(matches!(
            compose_message(&config, &report()),
            Err(ReportError::ConfigError(_))
        ));
    }
}
