//! Command-line interface for homesentry.
//!
//! Provides commands for watching a sensor board, replaying recorded
//! device output, classifying single lines and showing configuration.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use crate::adapters::{
    ChannelNotifier, CommandCamera, DeviceEndpoint, DeviceStream, LogNotifier, NoCamera, Notifier,
    SnapshotProvider,
};
use crate::config::{load_config, ResolvedConfig};
use crate::core::{shutdown_signal, Dispatcher, Monitor, MonitorSummary, StopReason};
use crate::domain::ChannelOutcome;
use crate::error::MonitorError;

/// homesentry - Serial sensor alerting loop
#[derive(Parser, Debug)]
#[command(name = "homesentry")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Config file (defaults to .homesentry/config.yaml in this or a parent directory)
    #[arg(short, long, global = true, env = "HOMESENTRY_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Watch the device and send alerts until Ctrl+C
    Watch {
        /// Device endpoint: serial port path, tcp://host:port, or - for stdin
        #[arg(short, long)]
        device: Option<String>,

        /// Serial baud rate
        #[arg(short, long)]
        baud: Option<u32>,

        /// Log alerts instead of sending them
        #[arg(long)]
        dry_run: bool,

        /// Do not take snapshots on motion
        #[arg(long)]
        no_camera: bool,
    },

    /// Feed a recorded device log through the monitor (nothing is sent)
    Replay {
        /// Log file, or - for stdin
        input: PathBuf,
    },

    /// Print the event tag for a single line
    Classify {
        /// Line as printed by the device
        line: String,
    },

    /// Show resolved configuration (secrets masked)
    Config,
}

impl Cli {
    /// Execute the CLI command
    pub async fn execute(self) -> Result<()> {
        let config_path = self.config.as_deref();

        match self.command {
            Commands::Watch {
                device,
                baud,
                dry_run,
                no_camera,
            } => watch(config_path, device, baud, dry_run, no_camera).await,
            Commands::Replay { input } => replay(config_path, &input).await,
            Commands::Classify { line } => classify_line(config_path, &line),
            Commands::Config => show_config(config_path),
        }
    }
}

/// Run the monitoring loop against the configured device
async fn watch(
    config_path: Option<&Path>,
    device: Option<String>,
    baud: Option<u32>,
    dry_run: bool,
    no_camera: bool,
) -> Result<()> {
    let mut config = load_config(config_path)?;
    if let Some(device) = device {
        config.device.endpoint = device;
    }
    if let Some(baud) = baud {
        config.device.baud_rate = baud;
    }
    config.validate(dry_run).context("Invalid configuration")?;

    let notifier: Box<dyn Notifier> = if dry_run {
        println!("ℹ️  Dry run: alerts are logged, not sent");
        Box::new(LogNotifier)
    } else {
        Box::new(ChannelNotifier::from_config(&config)?)
    };

    let camera: Box<dyn SnapshotProvider> = if no_camera || !config.camera.enabled {
        Box::new(NoCamera)
    } else {
        Box::new(CommandCamera::from_settings(&config.camera))
    };

    let endpoint = DeviceEndpoint::parse(&config.device.endpoint);
    let source = DeviceStream::open(
        &endpoint,
        config.device.baud_rate,
        Duration::from_millis(config.device.settle_ms),
    )
    .await?;

    println!("✅ Connected to {}", endpoint);
    println!("    Press Ctrl+C to stop");
    println!();

    let monitor = Monitor::new(
        Box::new(source),
        camera,
        Dispatcher::new(notifier, config.alert.clone()),
        config.patterns.clone(),
    );

    let summary = monitor.run_until(shutdown_signal()).await;
    print_summary(&summary);

    watch_outcome(&endpoint, &summary.stopped)?;
    Ok(())
}

/// A device that goes away while watching is an error; only Ctrl+C, or the
/// end of piped stdin, is a normal stop
fn watch_outcome(endpoint: &DeviceEndpoint, stopped: &StopReason) -> Result<(), MonitorError> {
    let reason = match (stopped, endpoint) {
        (StopReason::Interrupted, _) | (StopReason::EndOfStream, DeviceEndpoint::Stdin) => {
            return Ok(())
        }
        (StopReason::EndOfStream, _) => "stream ended".to_string(),
        (StopReason::ReadFailed(reason), _) => reason.clone(),
    };
    Err(MonitorError::DeviceLost {
        endpoint: endpoint.to_string(),
        reason,
    })
}

/// Replay a recorded log with the log-only notifier and no camera
async fn replay(config_path: Option<&Path>, input: &Path) -> Result<()> {
    let config = load_config(config_path)?;
    config.validate(true).context("Invalid configuration")?;

    let source = if input == Path::new("-") {
        DeviceStream::from_reader("stdin", tokio::io::stdin())
    } else {
        let file = tokio::fs::File::open(input)
            .await
            .with_context(|| format!("Failed to open {}", input.display()))?;
        DeviceStream::from_reader(input.display().to_string(), file)
    };

    let monitor = Monitor::new(
        Box::new(source),
        Box::new(NoCamera),
        Dispatcher::new(Box::new(LogNotifier), config.alert.clone()),
        config.patterns.clone(),
    );

    let summary = monitor.run_until(shutdown_signal()).await;
    print_summary(&summary);

    if let StopReason::ReadFailed(reason) = &summary.stopped {
        anyhow::bail!("Failed to read {}: {}", input.display(), reason);
    }
    Ok(())
}

fn classify_line(config_path: Option<&Path>, line: &str) -> Result<()> {
    let config = load_config(config_path)?;
    println!("{}", config.patterns.classify(line.trim()));
    Ok(())
}

fn show_config(config_path: Option<&Path>) -> Result<()> {
    let config: ResolvedConfig = load_config(config_path)?;

    println!();
    println!("homesentry configuration");
    println!("══════════════════════════════════════════════════════════════");
    for (key, value) in config.redacted() {
        println!("{:<26} {}", key, value);
    }
    println!();

    match config.validate(false) {
        Ok(()) => println!("✅ Ready to send alerts"),
        Err(e) => println!("⚠️  {} (use --dry-run to watch without sending)", e),
    }

    Ok(())
}

fn print_summary(summary: &MonitorSummary) {
    println!();
    println!("Session summary");
    println!("{}", "-".repeat(40));
    println!("{:<22} {}", "Lines read", summary.lines_read);
    println!("{:<22} {}", "Lines skipped", summary.lines_skipped);
    println!("{:<22} {}", "Snapshots captured", summary.snapshots_captured);
    println!("{:<22} {}", "Snapshots failed", summary.snapshots_failed);
    println!("{:<22} {}", "Alert bursts", summary.bursts);
    println!("{:<22} {}", "Alarms suppressed", summary.suppressed);
    println!("{:<22} {:?}", "Final state", summary.final_state);
    println!("{:<22} {}", "Stopped by", stop_label(&summary.stopped));

    if let Some(last) = &summary.last_dispatch {
        println!(
            "{:<22} episode {} at {} (mail: {}, sms: {})",
            "Last alert",
            last.episode,
            last.dispatched_at.format("%Y-%m-%d %H:%M:%S UTC"),
            outcome_label(&last.mail),
            outcome_label(&last.sms),
        );
    }
}

fn stop_label(stopped: &StopReason) -> &str {
    match stopped {
        StopReason::Interrupted => "Ctrl+C",
        StopReason::EndOfStream => "end of stream",
        StopReason::ReadFailed(reason) => reason,
    }
}

fn outcome_label(outcome: &ChannelOutcome) -> &str {
    match outcome {
        ChannelOutcome::Sent => "sent",
        ChannelOutcome::Failed(reason) => reason,
    }
}
