//! Alert burst dispatch.
//!
//! One burst = mail (with the latest snapshot when it still exists), then
//! SMS. The channels are independent: a mail failure never stops the SMS
//! attempt. Nothing is retried; failures are logged and recorded in the
//! returned [`DispatchResult`].

use std::path::Path;

use anyhow::Result;
use chrono::Utc;
use tracing::{debug, info, instrument, warn};

use crate::adapters::Notifier;
use crate::domain::{AlertTemplate, Channel, ChannelOutcome, DispatchResult, SnapshotHandle};
use crate::error::MonitorError;

/// Sends alert bursts through a notifier
pub struct Dispatcher {
    notifier: Box<dyn Notifier>,
    template: AlertTemplate,
}

impl Dispatcher {
    pub fn new(notifier: Box<dyn Notifier>, template: AlertTemplate) -> Self {
        Self { notifier, template }
    }

    pub fn template(&self) -> &AlertTemplate {
        &self.template
    }

    /// Attempt every channel once for `episode`
    #[instrument(skip(self, line, snapshot), fields(notifier = self.notifier.name()))]
    pub async fn dispatch(
        &self,
        episode: u64,
        line: &str,
        snapshot: Option<&SnapshotHandle>,
    ) -> DispatchResult {
        let attachment = snapshot.and_then(SnapshotHandle::resolve).map(Path::to_path_buf);
        if let (Some(handle), None) = (snapshot, &attachment) {
            warn!(
                "Snapshot {} no longer exists, sending without attachment",
                handle.path().display()
            );
        }

        info!("🚨 Danger detected! Sending alerts...");

        let payload = self.template.build(line, attachment.clone());

        let mail = outcome(
            Channel::Mail,
            episode,
            self.notifier.send_mail(&payload).await,
        );
        let sms = outcome(
            Channel::Sms,
            episode,
            self.notifier.send_text(&self.template.sms_body).await,
        );

        let result = DispatchResult {
            episode,
            line: line.to_string(),
            attachment,
            mail,
            sms,
            dispatched_at: Utc::now(),
        };

        if result.all_sent() {
            info!("✅ Email and SMS sent");
        } else if result.any_sent() {
            warn!(failed = ?result.failures(), "Alert partially delivered");
        } else {
            warn!("No alert channel delivered");
        }

        if let Ok(json) = serde_json::to_string(&result) {
            debug!(%json, "Dispatch result");
        }

        result
    }
}

fn outcome(channel: Channel, episode: u64, sent: Result<()>) -> ChannelOutcome {
    match sent {
        Ok(()) => ChannelOutcome::Sent,
        Err(e) => {
            let reason = format!("{:#}", e);
            warn!(
                "{}",
                MonitorError::ChannelSend {
                    channel,
                    episode,
                    reason: reason.clone(),
                }
            );
            ChannelOutcome::Failed(reason)
        }
    }
}
