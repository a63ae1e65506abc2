//! Alert payloads and dispatch outcomes.

use std::fmt;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Fixed wording used for every alert burst
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertTemplate {
    /// Mail subject line
    #[serde(default = "default_subject")]
    pub subject: String,

    /// First body section
    #[serde(default = "default_intro")]
    pub intro: String,

    /// Last body section
    #[serde(default = "default_call_to_action")]
    pub call_to_action: String,

    /// Short text sent over SMS
    #[serde(default = "default_sms_body")]
    pub sms_body: String,
}

fn default_subject() -> String {
    "🚨 Home Security Alert".to_string()
}
fn default_intro() -> String {
    "An alert has been triggered in your Smart Home System.".to_string()
}
fn default_call_to_action() -> String {
    "Please check your home immediately.".to_string()
}
fn default_sms_body() -> String {
    "🚨 Home Alert! Motion or Danger detected. Check your email for snapshot.".to_string()
}

impl Default for AlertTemplate {
    fn default() -> Self {
        Self {
            subject: default_subject(),
            intro: default_intro(),
            call_to_action: default_call_to_action(),
            sms_body: default_sms_body(),
        }
    }
}

impl AlertTemplate {
    /// Build the mail payload for one triggering line
    pub fn build(&self, line: &str, attachment: Option<PathBuf>) -> AlertPayload {
        AlertPayload {
            subject: self.subject.clone(),
            sections: vec![
                self.intro.clone(),
                format!("Details:\n{}", line),
                self.call_to_action.clone(),
            ],
            attachment,
        }
    }
}

/// Mail content for one dispatch. Built and discarded per burst.
#[derive(Debug, Clone, PartialEq)]
pub struct AlertPayload {
    pub subject: String,

    /// Body sections in display order
    pub sections: Vec<String>,

    /// Snapshot to attach, already checked to exist
    pub attachment: Option<PathBuf>,
}

impl AlertPayload {
    /// Plain-text body with sections separated by blank lines
    pub fn body(&self) -> String {
        self.sections.join("\n\n")
    }

    pub fn attachment(&self) -> Option<&Path> {
        self.attachment.as_deref()
    }
}

/// Notification channels attempted during a burst
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Channel {
    Mail,
    Sms,
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Channel::Mail => f.write_str("mail"),
            Channel::Sms => f.write_str("sms"),
        }
    }
}

/// Result of one channel attempt
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "status", content = "reason")]
pub enum ChannelOutcome {
    Sent,
    Failed(String),
}

impl ChannelOutcome {
    pub fn is_sent(&self) -> bool {
        matches!(self, ChannelOutcome::Sent)
    }
}

/// Per-channel record of one dispatch burst
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DispatchResult {
    /// Episode number (1-based) this burst belongs to
    pub episode: u64,

    /// Raw device line that opened the episode
    pub line: String,

    /// Snapshot attached to the mail, if any
    pub attachment: Option<PathBuf>,

    pub mail: ChannelOutcome,

    pub sms: ChannelOutcome,

    pub dispatched_at: DateTime<Utc>,
}

impl DispatchResult {
    /// True when every channel delivered
    pub fn all_sent(&self) -> bool {
        self.mail.is_sent() && self.sms.is_sent()
    }

    /// True when at least one channel delivered
    pub fn any_sent(&self) -> bool {
        self.mail.is_sent() || self.sms.is_sent()
    }

    /// True when some channels delivered and others failed
    pub fn is_mixed(&self) -> bool {
        self.any_sent() && !self.all_sent()
    }

    /// Failed channels with their reasons
    pub fn failures(&self) -> Vec<(Channel, &str)> {
        [(Channel::Mail, &self.mail), (Channel::Sms, &self.sms)]
            .into_iter()
            .filter_map(|(channel, outcome)| match outcome {
                ChannelOutcome::Failed(reason) => Some((channel, reason.as_str())),
                ChannelOutcome::Sent => None,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(mail: ChannelOutcome, sms: ChannelOutcome) -> DispatchResult {
        DispatchResult {
            episode: 1,
            line: "DANGER".to_string(),
            attachment: None,
            mail,
            sms,
            dispatched_at: Utc::now(),
        }
    }

    #[test]
    fn test_template_builds_three_sections() {
        let payload = AlertTemplate::default().build("DANGER: breach", None);

        assert_eq!(payload.subject, "🚨 Home Security Alert");
        assert_eq!(payload.sections.len(), 3);
        assert_eq!(payload.sections[1], "Details:\nDANGER: breach");
        assert!(payload.body().starts_with("An alert has been triggered"));
        assert!(payload.body().ends_with("Please check your home immediately."));
        assert!(payload.attachment().is_none());
    }

    #[test]
    fn test_template_partial_yaml_keeps_defaults() {
        let template: AlertTemplate = serde_yaml::from_str("subject: Garage alert\n").unwrap();
        assert_eq!(template.subject, "Garage alert");
        assert_eq!(template.sms_body, AlertTemplate::default().sms_body);
    }

    #[test]
    fn test_mixed_outcome() {
        let mixed = result(ChannelOutcome::Failed("smtp down".to_string()), ChannelOutcome::Sent);
        assert!(mixed.is_mixed());
        assert!(mixed.any_sent());
        assert!(!mixed.all_sent());
        assert_eq!(mixed.failures(), vec![(Channel::Mail, "smtp down")]);

        let ok = result(ChannelOutcome::Sent, ChannelOutcome::Sent);
        assert!(ok.all_sent());
        assert!(!ok.is_mixed());
        assert!(ok.failures().is_empty());
    }

    #[test]
    fn test_outcome_serialization() {
        let json = serde_json::to_value(ChannelOutcome::Failed("timeout".to_string())).unwrap();
        assert_eq!(json, serde_json::json!({"status": "failed", "reason": "timeout"}));

        let json = serde_json::to_value(ChannelOutcome::Sent).unwrap();
        assert_eq!(json, serde_json::json!({"status": "sent"}));
    }
}
