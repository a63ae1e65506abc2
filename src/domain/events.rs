//! Event tags derived from device status lines.
//!
//! A tag is the only thing the rest of the system learns about a line
//! (besides its raw text, which is quoted in alerts).

use std::fmt;

use serde::{Deserialize, Serialize};

/// Semantic classification of one device line.
///
/// Variants are declared in classifier priority order: when a line could
/// match several pattern groups, the earliest variant wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventTag {
    /// Danger, breach or high-risk report from the sensor
    Alarm,

    /// Motion sensor reports the scene is quiet again
    MotionStopped,

    /// Motion sensor tripped
    MotionStarted,

    /// Device (re)booted and printed its banner
    SystemReset,

    /// Anything else the device prints
    Unclassified,
}

impl EventTag {
    /// All tags, highest priority first
    pub const PRIORITY: [EventTag; 5] = [
        EventTag::Alarm,
        EventTag::MotionStopped,
        EventTag::MotionStarted,
        EventTag::SystemReset,
        EventTag::Unclassified,
    ];

    /// Stable lowercase name used in logs and CLI output
    pub fn as_str(&self) -> &'static str {
        match self {
            EventTag::Alarm => "alarm",
            EventTag::MotionStopped => "motion_stopped",
            EventTag::MotionStarted => "motion_started",
            EventTag::SystemReset => "system_reset",
            EventTag::Unclassified => "unclassified",
        }
    }

    /// Whether this tag closes an open alarm episode
    pub fn is_reset(&self) -> bool {
        matches!(self, EventTag::MotionStopped | EventTag::SystemReset)
    }
}

impl Default for EventTag {
    fn default() -> Self {
        Self::Unclassified
    }
}

impl fmt::Display for EventTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reset_tags() {
        assert!(EventTag::MotionStopped.is_reset());
        assert!(EventTag::SystemReset.is_reset());

        assert!(!EventTag::Alarm.is_reset());
        assert!(!EventTag::MotionStarted.is_reset());
        assert!(!EventTag::Unclassified.is_reset());
    }

    #[test]
    fn test_priority_order() {
        assert_eq!(EventTag::PRIORITY[0], EventTag::Alarm);
        assert_eq!(EventTag::PRIORITY[4], EventTag::Unclassified);
    }

    #[test]
    fn test_serialization_uses_snake_case() {
        let json = serde_json::to_string(&EventTag::MotionStarted).unwrap();
        assert_eq!(json, "\"motion_started\"");
        assert_eq!(EventTag::MotionStarted.to_string(), "motion_started");
    }
}
