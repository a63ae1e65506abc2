//! Mail delivery over an HTTP mail API.
//!
//! Speaks the Mailgun-style `POST /v3/<domain>/messages` endpoint: multipart
//! form with `from`, `to`, `subject`, `text` and an optional `attachment`
//! file part, authenticated with HTTP basic auth (`api:<key>`).

use std::path::Path;

use anyhow::{Context, Result};
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use tracing::{debug, warn};

use crate::config::MailSettings;
use crate::domain::AlertPayload;
use crate::error::MonitorError;

/// Mail API client
pub struct MailClient {
    api_base: String,
    domain: String,
    api_key: String,
    from: String,
    to: String,
    client: reqwest::Client,
}

/// Response from the mail API
#[derive(Debug, Deserialize)]
struct MailResponse {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

impl MailClient {
    /// Create a client sharing an existing HTTP client
    pub fn new(
        api_base: impl Into<String>,
        domain: impl Into<String>,
        api_key: impl Into<String>,
        from: impl Into<String>,
        to: impl Into<String>,
        client: reqwest::Client,
    ) -> Self {
        Self {
            api_base: api_base.into(),
            domain: domain.into(),
            api_key: api_key.into(),
            from: from.into(),
            to: to.into(),
            client,
        }
    }

    /// Create from settings; every mail field must be present
    pub fn from_settings(settings: &MailSettings, client: reqwest::Client) -> Result<Self> {
        Ok(Self::new(
            settings.api_base.clone(),
            settings.domain.clone().context("mail.domain is not set")?,
            settings.api_key.clone().context("mail.api_key is not set")?,
            settings.from.clone().context("mail.from is not set")?,
            settings.to.clone().context("mail.to is not set")?,
            client,
        ))
    }

    /// Build API URL
    fn api_url(&self) -> String {
        format!(
            "{}/v3/{}/messages",
            self.api_base.trim_end_matches('/'),
            self.domain
        )
    }

    /// Send the alert mail, returning the provider's message id
    pub async fn send(&self, payload: &AlertPayload) -> Result<String> {
        let mut form = Form::new()
            .text("from", self.from.clone())
            .text("to", self.to.clone())
            .text("subject", payload.subject.clone())
            .text("text", payload.body());

        if let Some(part) = optional_attachment(payload.attachment()).await {
            form = form.part("attachment", part);
        }

        let response = self
            .client
            .post(self.api_url())
            .basic_auth("api", Some(&self.api_key))
            .multipart(form)
            .send()
            .await
            .context("Failed to send mail")?;

        let status = response.status();
        let text = response.text().await.unwrap_or_default();

        if !status.is_success() {
            let detail = serde_json::from_str::<MailResponse>(&text)
                .ok()
                .and_then(|r| r.message)
                .unwrap_or(text);
            anyhow::bail!("Mail API error ({}): {}", status, detail);
        }

        let id = serde_json::from_str::<MailResponse>(&text)
            .ok()
            .and_then(|r| r.id)
            .unwrap_or_default();
        debug!(%id, to = %self.to, "Mail accepted");

        Ok(id)
    }
}

/// Attachment part for the mail; a snapshot that cannot be read is dropped
/// and the mail goes out without it
async fn optional_attachment(path: Option<&Path>) -> Option<Part> {
    let path = path?;
    match attachment_part(path).await {
        Ok(part) => Some(part),
        Err(e) => {
            warn!("{}", MonitorError::CaptureUnavailable(format!("{:#}", e)));
            None
        }
    }
}

/// Read a snapshot into a multipart file part
async fn attachment_part(path: &Path) -> Result<Part> {
    let file_name = path
        .file_name()
        .unwrap_or_default()
        .to_string_lossy()
        .to_string();

    let bytes = tokio::fs::read(path)
        .await
        .with_context(|| format!("Failed to read attachment {}", path.display()))?;

    Ok(Part::bytes(bytes)
        .file_name(file_name)
        .mime_str(mime_for(path))?)
}

fn mime_for(path: &Path) -> &'static str {
    match path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase())
        .as_deref()
    {
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("png") => "image/png",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> MailClient {
        MailClient::new(
            "https://api.mailgun.net/",
            "mg.example.com",
            "KEY",
            "alerts@example.com",
            "me@example.com",
            reqwest::Client::new(),
        )
    }

    #[test]
    fn test_api_url() {
        assert_eq!(
            client().api_url(),
            "https://api.mailgun.net/v3/mg.example.com/messages"
        );
    }

    #[test]
    fn test_mime_for() {
        assert_eq!(mime_for(Path::new("snapshot_1.jpg")), "image/jpeg");
        assert_eq!(mime_for(Path::new("snapshot_1.JPEG")), "image/jpeg");
        assert_eq!(mime_for(Path::new("frame.png")), "image/png");
        assert_eq!(mime_for(Path::new("frame")), "application/octet-stream");
    }

    #[test]
    fn test_from_settings_requires_fields() {
        let settings = MailSettings::default();
        let err = MailClient::from_settings(&settings, reqwest::Client::new())
            .err()
            .expect("missing settings");
        assert!(err.to_string().contains("mail.domain"));
    }

    #[tokio::test]
    async fn test_missing_attachment_fails() {
        let result = attachment_part(Path::new("/nonexistent/snapshot_0.jpg")).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_unreadable_snapshot_is_dropped() {
        let temp = tempfile::TempDir::new().unwrap();

        // Deleted between capture and send
        let gone = temp.path().join("snapshot_1.jpg");
        assert!(optional_attachment(Some(gone.as_path())).await.is_none());

        // A directory exists but cannot be read as a file
        assert!(optional_attachment(Some(temp.path())).await.is_none());

        assert!(optional_attachment(None).await.is_none());
    }

    #[tokio::test]
    async fn test_readable_snapshot_is_attached() {
        let temp = tempfile::TempDir::new().unwrap();
        let path = temp.path().join("snapshot_2.jpg");
        std::fs::write(&path, b"jpeg").unwrap();

        assert!(optional_attachment(Some(path.as_path())).await.is_some());
    }
}
