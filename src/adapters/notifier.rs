//! Notifier implementations.

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use tracing::info;

use super::{MailClient, Notifier, SmsClient};
use crate::config::ResolvedConfig;
use crate::domain::AlertPayload;

/// Mail + SMS notifier backed by the HTTP APIs
pub struct ChannelNotifier {
    mail: MailClient,
    sms: SmsClient,
}

impl ChannelNotifier {
    pub fn new(mail: MailClient, sms: SmsClient) -> Self {
        Self { mail, sms }
    }

    /// Build both channels from configuration, sharing one HTTP client
    pub fn from_config(config: &ResolvedConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.http_timeout_seconds))
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self::new(
            MailClient::from_settings(&config.mail, client.clone())?,
            SmsClient::from_settings(&config.sms, client)?,
        ))
    }
}

#[async_trait]
impl Notifier for ChannelNotifier {
    fn name(&self) -> &str {
        "mail+sms"
    }

    async fn send_mail(&self, payload: &AlertPayload) -> Result<()> {
        self.mail.send(payload).await.map(|_| ())
    }

    async fn send_text(&self, body: &str) -> Result<()> {
        self.sms.send(body).await.map(|_| ())
    }
}

/// Notifier that only logs what it would send (dry runs, replays)
#[derive(Debug, Default)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    fn name(&self) -> &str {
        "log"
    }

    async fn send_mail(&self, payload: &AlertPayload) -> Result<()> {
        info!(
            subject = %payload.subject,
            attachment = ?payload.attachment(),
            "[dry-run] mail: {}",
            payload.body().replace('\n', " | ")
        );
        Ok(())
    }

    async fn send_text(&self, body: &str) -> Result<()> {
        info!("[dry-run] sms: {}", body);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{MailSettings, SmsSettings};
    use crate::domain::AlertTemplate;

    #[tokio::test]
    async fn test_log_notifier_always_succeeds() {
        let payload = AlertTemplate::default().build("DANGER", None);

        assert!(LogNotifier.send_mail(&payload).await.is_ok());
        assert!(LogNotifier.send_text("hi").await.is_ok());
        assert_eq!(LogNotifier.name(), "log");
    }

    #[test]
    fn test_from_config_needs_both_channels() {
        let mut config = ResolvedConfig::default();
        config.mail = MailSettings {
            domain: Some("mg.example.com".to_string()),
            api_key: Some("key".to_string()),
            from: Some("alerts@example.com".to_string()),
            to: Some("me@example.com".to_string()),
            ..Default::default()
        };
        assert!(ChannelNotifier::from_config(&config).is_err());

        config.sms = SmsSettings {
            account_sid: Some("AC1".to_string()),
            auth_token: Some("token".to_string()),
            from: Some("+15550001111".to_string()),
            to: Some("+15550002222".to_string()),
            ..Default::default()
        };
        assert!(ChannelNotifier::from_config(&config).is_ok());
    }
}
