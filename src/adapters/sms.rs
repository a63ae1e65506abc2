//! SMS delivery through the Twilio REST API.

use anyhow::{Context, Result};
use serde::Deserialize;
use tracing::info;

use crate::config::SmsSettings;

/// Twilio Messages API client
pub struct SmsClient {
    api_base: String,
    account_sid: String,
    auth_token: String,
    from: String,
    to: String,
    client: reqwest::Client,
}

/// Response from the Messages endpoint
#[derive(Debug, Deserialize)]
struct MessageResponse {
    #[serde(default)]
    sid: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

impl SmsClient {
    pub fn new(
        api_base: impl Into<String>,
        account_sid: impl Into<String>,
        auth_token: impl Into<String>,
        from: impl Into<String>,
        to: impl Into<String>,
        client: reqwest::Client,
    ) -> Self {
        Self {
            api_base: api_base.into(),
            account_sid: account_sid.into(),
            auth_token: auth_token.into(),
            from: from.into(),
            to: to.into(),
            client,
        }
    }

    /// Create from settings; every SMS field must be present
    pub fn from_settings(settings: &SmsSettings, client: reqwest::Client) -> Result<Self> {
        Ok(Self::new(
            settings.api_base.clone(),
            settings
                .account_sid
                .clone()
                .context("sms.account_sid is not set")?,
            settings
                .auth_token
                .clone()
                .context("sms.auth_token is not set")?,
            settings.from.clone().context("sms.from is not set")?,
            settings.to.clone().context("sms.to is not set")?,
            client,
        ))
    }

    /// Build API URL
    fn api_url(&self) -> String {
        format!(
            "{}/2010-04-01/Accounts/{}/Messages.json",
            self.api_base.trim_end_matches('/'),
            self.account_sid
        )
    }

    /// Send a text message, returning the message SID
    pub async fn send(&self, body: &str) -> Result<String> {
        let response = self
            .client
            .post(self.api_url())
            .basic_auth(&self.account_sid, Some(&self.auth_token))
            .form(&[
                ("To", self.to.as_str()),
                ("From", self.from.as_str()),
                ("Body", body),
            ])
            .send()
            .await
            .context("Failed to send SMS")?;

        let status = response.status();
        let text = response.text().await.unwrap_or_default();

        let sid = message_sid(status, &text)?;
        info!("📲 SMS sent! SID: {}", sid);

        Ok(sid)
    }
}

/// Check the status first so a non-JSON error page still reports it
fn message_sid(status: reqwest::StatusCode, text: &str) -> Result<String> {
    if !status.is_success() {
        let detail = serde_json::from_str::<MessageResponse>(text)
            .ok()
            .and_then(|r| r.message)
            .unwrap_or_else(|| text.to_string());
        anyhow::bail!("SMS API error ({}): {}", status, detail);
    }

    let result: MessageResponse =
        serde_json::from_str(text).context("Failed to parse SMS response")?;
    Ok(result.sid.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_url() {
        let client = SmsClient::new(
            "https://api.twilio.com",
            "AC123",
            "TOKEN",
            "+15550001111",
            "+15550002222",
            reqwest::Client::new(),
        );
        assert_eq!(
            client.api_url(),
            "https://api.twilio.com/2010-04-01/Accounts/AC123/Messages.json"
        );
    }

    #[test]
    fn test_error_page_keeps_status() {
        let err = message_sid(reqwest::StatusCode::BAD_GATEWAY, "<html>502 Bad Gateway</html>")
            .unwrap_err()
            .to_string();
        assert!(err.contains("502"));
        assert!(err.contains("<html>502 Bad Gateway</html>"));
    }

    #[test]
    fn test_api_error_message() {
        let body = r#"{"code": 21211, "message": "Invalid 'To' Phone Number"}"#;
        let err = message_sid(reqwest::StatusCode::BAD_REQUEST, body)
            .unwrap_err()
            .to_string();
        assert!(err.contains("400"));
        assert!(err.contains("Invalid 'To' Phone Number"));
    }

    #[test]
    fn test_created_returns_sid() {
        let sid = message_sid(reqwest::StatusCode::CREATED, r#"{"sid": "SM123"}"#).unwrap();
        assert_eq!(sid, "SM123");
    }

    #[test]
    fn test_from_settings_requires_fields() {
        let settings = SmsSettings {
            account_sid: Some("AC123".to_string()),
            ..Default::default()
        };
        let err = SmsClient::from_settings(&settings, reqwest::Client::new())
            .err()
            .expect("missing settings");
        assert!(err.to_string().contains("sms.auth_token"));
    }
}
