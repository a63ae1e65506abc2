//! Device Stream Integration Tests
//!
//! Feeds raw serial bytes through `DeviceStream` into the monitor to check
//! framing, decoding and end-of-stream handling together.

use homesentry::adapters::{DeviceStream, LogNotifier, NoCamera};
use homesentry::core::Dispatcher;
use homesentry::domain::AlertTemplate;
use homesentry::{classify, EpisodeState, EventTag, Monitor, PatternSet};

fn monitor_over(mock: tokio_test::io::Mock) -> Monitor {
    Monitor::new(
        Box::new(DeviceStream::from_reader("mock-serial", mock)),
        Box::new(NoCamera),
        Dispatcher::new(Box::new(LogNotifier), AlertTemplate::default()),
        PatternSet::default(),
    )
}

#[tokio::test]
async fn test_serial_bytes_drive_one_burst() {
    let mock = tokio_test::io::Builder::new()
        .read(b"System Initialized\r\n")
        .read(b"Motion det")
        .read(b"ected\r\nDANGER: Intruder\r\nDANGER: Intruder\r\n")
        .build();

    let summary = monitor_over(mock).run_until(std::future::pending()).await;

    assert_eq!(summary.lines_read, 4);
    assert_eq!(summary.bursts, 1);
    assert_eq!(summary.suppressed, 1);
    // NoCamera never yields a snapshot
    assert_eq!(summary.snapshots_failed, 1);
    assert_eq!(summary.final_state, EpisodeState::Alerted);

    let last = summary.last_dispatch.unwrap();
    assert_eq!(last.line, "DANGER: Intruder");
    assert!(last.attachment.is_none());
    assert!(last.all_sent());
}

#[tokio::test]
async fn test_garbled_bytes_are_skipped() {
    let mock = tokio_test::io::Builder::new()
        .read(b"\xff\xfeDANGER\r\n")
        .read(b"\r\n")
        .read(b"Motion stopped\r\n")
        .build();

    let summary = monitor_over(mock).run_until(std::future::pending()).await;

    assert_eq!(summary.lines_skipped, 1);
    assert_eq!(summary.lines_read, 1);
    assert_eq!(summary.bursts, 0);
    assert_eq!(summary.final_state, EpisodeState::Armed);
}

#[test]
fn test_classify_reexport() {
    assert_eq!(classify("Motion detected"), EventTag::MotionStarted);
    assert_eq!(classify("DANGER: Motion detected"), EventTag::Alarm);
}
