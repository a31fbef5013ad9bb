use crate::config::MailConfig;
use crate::errors::Result;
use crate::mailer::{compose_message, Mailer};
use crate::models::report::Report;
use async_trait::async_trait;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Tokio1Executor};
use log::info;

/// Authenticated STARTTLS submission to the configured relay.
pub struct SmtpMailer {
    config: MailConfig,
    transport: AsyncSmtpTransport<Tokio1Executor>,
}

impl SmtpMailer {
    pub fn new(config: MailConfig) -> Result<Self> {
        config.validate()?;

        let credentials = Credentials::new(config.username.clone(), config.password.clone());
        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.smtp_host)?
            .port(config.smtp_port)
            .credentials(credentials)
            .build();

        Ok(Self { config, transport })
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send_report(&self, report: &Report) -> Result<()> {
        let message = compose_message(&self.config, report)?;

        info!(
            "Sending report with {} charts to {} recipients via {}:{}",
            report.charts.len(),
            self.config.recipients.len(),
            self.config.smtp_host,
            self.config.smtp_port
        );
        self.transport.send(message).await?;
        info!("Report for {} sent", report.date);
        Ok(())
    }
}
