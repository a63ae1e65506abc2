//! Monitoring loop.
//!
//! Reads one line at a time from the device, classifies it, feeds the tag to
//! the episode state machine and performs the requested side effect before
//! reading the next line. Everything runs on the calling task; an alert burst
//! blocks reading until it finishes.

use std::future::Future;

use serde::Serialize;
use tracing::{debug, error, info, warn};

use crate::adapters::{LineSource, SnapshotProvider};
use crate::domain::{DispatchResult, EventTag, SnapshotHandle};
use crate::error::MonitorError;

use super::classifier::PatternSet;
use super::dispatcher::Dispatcher;
use super::episode::{Action, AlertEpisode, EpisodeState};

/// Why `run_until` returned
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", content = "detail", rename_all = "snake_case")]
pub enum StopReason {
    /// Shutdown signal (Ctrl+C)
    #[default]
    Interrupted,

    /// The device stream reached EOF
    EndOfStream,

    /// Reading from the open device stream failed
    ReadFailed(String),
}

/// Counters reported when the loop exits
#[derive(Debug, Clone, Default, Serialize)]
pub struct MonitorSummary {
    /// Non-empty lines decoded and classified
    pub lines_read: u64,

    /// Lines dropped because they were not valid UTF-8
    pub lines_skipped: u64,

    pub snapshots_captured: u64,

    /// Motion events where the camera produced nothing
    pub snapshots_failed: u64,

    /// Alert bursts dispatched (one per episode)
    pub bursts: u64,

    /// Alarm lines suppressed inside an already alerted episode
    pub suppressed: u64,

    pub final_state: EpisodeState,

    pub stopped: StopReason,

    pub last_dispatch: Option<DispatchResult>,
}

/// Drives classification, debouncing and dispatch for one device
pub struct Monitor {
    source: Box<dyn LineSource>,
    camera: Box<dyn SnapshotProvider>,
    dispatcher: Dispatcher,
    patterns: PatternSet,
    episode: AlertEpisode,
    latest_snapshot: Option<SnapshotHandle>,

    /// Stop/reset lines seen so far
    resets: u64,

    /// Value of `resets` when `latest_snapshot` was written
    snapshot_generation: u64,

    summary: MonitorSummary,
}

impl Monitor {
    pub fn new(
        source: Box<dyn LineSource>,
        camera: Box<dyn SnapshotProvider>,
        dispatcher: Dispatcher,
        patterns: PatternSet,
    ) -> Self {
        Self {
            source,
            camera,
            dispatcher,
            patterns,
            episode: AlertEpisode::new(),
            latest_snapshot: None,
            resets: 0,
            snapshot_generation: 0,
            summary: MonitorSummary::default(),
        }
    }

    pub fn state(&self) -> EpisodeState {
        self.episode.state()
    }

    pub fn latest_snapshot(&self) -> Option<&SnapshotHandle> {
        self.latest_snapshot.as_ref()
    }

    /// Latest snapshot, unless a stop/reset line arrived after it was taken
    pub fn attachable_snapshot(&self) -> Option<&SnapshotHandle> {
        self.latest_snapshot
            .as_ref()
            .filter(|_| self.snapshot_generation == self.resets)
    }

    pub fn summary(&self) -> &MonitorSummary {
        &self.summary
    }

    /// Handle one undecoded line. Invalid UTF-8 is logged and skipped.
    pub async fn process_bytes(&mut self, bytes: Vec<u8>) -> Option<DispatchResult> {
        let len = bytes.len();
        match String::from_utf8(bytes) {
            Ok(line) => self.process_line(&line).await,
            Err(source) => {
                self.summary.lines_skipped += 1;
                warn!("{}", MonitorError::Decode { len, source });
                None
            }
        }
    }

    /// Handle one decoded line; returns the burst result if one was sent
    pub async fn process_line(&mut self, raw: &str) -> Option<DispatchResult> {
        let line = raw.trim();
        if line.is_empty() {
            return None;
        }

        self.summary.lines_read += 1;
        info!(target: "device", "{}", line);

        let tag = self.patterns.classify(line);
        if tag != EventTag::Unclassified {
            debug!(%tag, state = ?self.episode.state(), "Classified line");
        }

        match self.episode.step(tag) {
            Action::CaptureSnapshot => {
                self.latest_snapshot = self.camera.capture().await;
                self.snapshot_generation = self.resets;
                if self.latest_snapshot.is_some() {
                    self.summary.snapshots_captured += 1;
                } else {
                    self.summary.snapshots_failed += 1;
                }
                None
            }
            Action::Dispatch { episode } => {
                let result = self
                    .dispatcher
                    .dispatch(episode, line, self.attachable_snapshot())
                    .await;
                self.summary.bursts += 1;
                self.summary.last_dispatch = Some(result.clone());
                Some(result)
            }
            Action::Suppress { episode } => {
                self.summary.suppressed += 1;
                debug!(episode, "Alert already sent for this episode");
                None
            }
            Action::Rearm { closed } => {
                self.resets += 1;
                if let Some(episode) = closed {
                    info!(episode, "Episode closed by {}, alerts re-armed", tag);
                }
                None
            }
            Action::None => None,
        }
    }

    /// Run until `shutdown` resolves or the device stream ends or fails.
    ///
    /// The returned summary records which of the three happened in `stopped`.
    /// Shutdown is only observed between lines; a burst in progress always
    /// completes. The device stream is released before returning.
    pub async fn run_until<F>(mut self, shutdown: F) -> MonitorSummary
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);

        info!(
            camera = self.camera.name(),
            "🔍 Monitoring {} output...",
            self.source.describe()
        );

        let stopped = loop {
            let read = tokio::select! {
                biased;
                _ = &mut shutdown => {
                    info!("🛑 Monitoring stopped.");
                    break StopReason::Interrupted;
                }
                read = self.source.next_line() => read,
            };

            match read {
                Ok(Some(bytes)) => {
                    self.process_bytes(bytes).await;
                }
                Ok(None) => {
                    info!("Device stream ended");
                    break StopReason::EndOfStream;
                }
                Err(e) => {
                    error!("Device read failed: {:#}", e);
                    break StopReason::ReadFailed(format!("{:#}", e));
                }
            }
        };

        self.summary.stopped = stopped;
        self.summary.final_state = self.episode.state();

        let Monitor {
            source, summary, ..
        } = self;
        let name = source.describe().to_string();
        drop(source);
        info!("🔌 Connection to {} closed.", name);

        summary
    }
}

/// Resolves on Ctrl+C (SIGINT)
pub async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for Ctrl+C: {}", e);
        std::future::pending::<()>().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;

    use anyhow::Result;
    use async_trait::async_trait;

    use crate::adapters::{LogNotifier, NoCamera};
    use crate::domain::AlertTemplate;

    struct Script(VecDeque<Result<Vec<u8>>>);

    #[async_trait]
    impl LineSource for Script {
        fn describe(&self) -> &str {
            "script"
        }

        async fn next_line(&mut self) -> Result<Option<Vec<u8>>> {
            self.0.pop_front().transpose()
        }
    }

    fn monitor(lines: Vec<Result<Vec<u8>>>) -> Monitor {
        Monitor::new(
            Box::new(Script(lines.into())),
            Box::new(NoCamera),
            Dispatcher::new(Box::new(LogNotifier), AlertTemplate::default()),
            PatternSet::default(),
        )
    }

    #[tokio::test]
    async fn test_blank_and_padded_lines() {
        let mut monitor = monitor(Vec::new());

        assert!(monitor.process_line("   ").await.is_none());
        assert_eq!(monitor.summary().lines_read, 0);

        let result = monitor.process_line("  DANGER  \r").await.expect("dispatch");
        assert_eq!(result.line, "DANGER");
        assert_eq!(monitor.summary().lines_read, 1);
    }

    #[tokio::test]
    async fn test_invalid_utf8_is_skipped() {
        let mut monitor = monitor(Vec::new());

        assert!(monitor.process_bytes(vec![0x44, 0xff, 0xfe]).await.is_none());
        assert_eq!(monitor.summary().lines_skipped, 1);
        assert_eq!(monitor.state(), EpisodeState::Armed);

        assert!(monitor.process_bytes(b"DANGER".to_vec()).await.is_some());
        assert_eq!(monitor.state(), EpisodeState::Alerted);
    }

    #[tokio::test]
    async fn test_run_stops_on_read_error() {
        let monitor = monitor(vec![
            Ok(b"DANGER".to_vec()),
            Err(anyhow::anyhow!("port unplugged")),
            Ok(b"Motion stopped".to_vec()),
        ]);

        let summary = monitor.run_until(std::future::pending()).await;
        assert_eq!(summary.lines_read, 1);
        assert_eq!(summary.bursts, 1);
        assert_eq!(summary.final_state, EpisodeState::Alerted);
        assert_eq!(
            summary.stopped,
            StopReason::ReadFailed("port unplugged".to_string())
        );
    }

    #[tokio::test]
    async fn test_run_reports_end_of_stream() {
        let monitor = monitor(vec![Ok(b"Temp: 21C".to_vec())]);

        let summary = monitor.run_until(std::future::pending()).await;
        assert_eq!(summary.lines_read, 1);
        assert_eq!(summary.stopped, StopReason::EndOfStream);
    }

    #[tokio::test]
    async fn test_run_stops_on_shutdown() {
        let monitor = monitor(vec![Ok(b"DANGER".to_vec())]);

        let summary = monitor.run_until(std::future::ready(())).await;
        assert_eq!(summary.lines_read, 0);
        assert_eq!(summary.stopped, StopReason::Interrupted);
        assert_eq!(summary.final_state, EpisodeState::Armed);
    }

    #[tokio::test]
    async fn test_failed_capture_is_counted() {
        let mut monitor = monitor(Vec::new());

        monitor.process_line("Motion detected").await;
        assert!(monitor.latest_snapshot().is_none());
        assert_eq!(monitor.summary().snapshots_failed, 1);
        assert_eq!(monitor.state(), EpisodeState::Armed);
    }
}
