//! Line classification.
//!
//! Maps one raw device line to one [`EventTag`] by case-sensitive substring
//! containment. Pattern groups are checked in [`EventTag::PRIORITY`] order so
//! a line that matches several groups always gets the strongest tag.

use std::sync::OnceLock;

use serde::{Deserialize, Serialize};

use crate::domain::EventTag;

static DEFAULT_PATTERNS: OnceLock<PatternSet> = OnceLock::new();

/// Substrings that identify each event tag
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatternSet {
    /// Any of these marks the line as an alarm
    #[serde(default = "default_alarm")]
    pub alarm: Vec<String>,

    #[serde(default = "default_motion_stopped")]
    pub motion_stopped: Vec<String>,

    #[serde(default = "default_motion_started")]
    pub motion_started: Vec<String>,

    /// Boot banner printed by the device
    #[serde(default = "default_system_reset")]
    pub system_reset: Vec<String>,
}

fn default_alarm() -> Vec<String> {
    vec![
        "DANGER".to_string(),
        "Security Breach".to_string(),
        "High Risk".to_string(),
    ]
}
fn default_motion_stopped() -> Vec<String> {
    vec!["Motion stopped".to_string()]
}
fn default_motion_started() -> Vec<String> {
    vec!["Motion detected".to_string()]
}
fn default_system_reset() -> Vec<String> {
    vec!["System Initialized".to_string()]
}

impl Default for PatternSet {
    fn default() -> Self {
        Self {
            alarm: default_alarm(),
            motion_stopped: default_motion_stopped(),
            motion_started: default_motion_started(),
            system_reset: default_system_reset(),
        }
    }
}

impl PatternSet {
    /// Classify a line. Never fails; unmatched input is `Unclassified`.
    pub fn classify(&self, line: &str) -> EventTag {
        EventTag::PRIORITY
            .into_iter()
            .find(|tag| contains_any(line, self.patterns_for(*tag)))
            .unwrap_or(EventTag::Unclassified)
    }

    /// Patterns configured for a tag (empty for `Unclassified`)
    pub fn patterns_for(&self, tag: EventTag) -> &[String] {
        match tag {
            EventTag::Alarm => &self.alarm,
            EventTag::MotionStopped => &self.motion_stopped,
            EventTag::MotionStarted => &self.motion_started,
            EventTag::SystemReset => &self.system_reset,
            EventTag::Unclassified => &[],
        }
    }
}

/// Classify with the built-in pattern set
pub fn classify(line: &str) -> EventTag {
    DEFAULT_PATTERNS.get_or_init(PatternSet::default).classify(line)
}

// Empty needles are skipped: "".contains("") would tag every line.
fn contains_any(line: &str, needles: &[String]) -> bool {
    needles
        .iter()
        .any(|needle| !needle.is_empty() && line.contains(needle.as_str()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_patterns() {
        assert_eq!(classify("DANGER: gas level high"), EventTag::Alarm);
        assert_eq!(classify("!! Security Breach at door"), EventTag::Alarm);
        assert_eq!(classify("High Risk"), EventTag::Alarm);
        assert_eq!(classify("Motion detected"), EventTag::MotionStarted);
        assert_eq!(classify("Motion stopped"), EventTag::MotionStopped);
        assert_eq!(classify("System Initialized"), EventTag::SystemReset);
        assert_eq!(classify("Temp: 22.5C"), EventTag::Unclassified);
        assert_eq!(classify(""), EventTag::Unclassified);
    }

    #[test]
    fn test_matching_is_case_sensitive() {
        assert_eq!(classify("danger"), EventTag::Unclassified);
        assert_eq!(classify("motion detected"), EventTag::Unclassified);
    }

    #[test]
    fn test_alarm_beats_motion() {
        assert_eq!(classify("Motion detected - DANGER"), EventTag::Alarm);
        assert_eq!(classify("Motion stopped, High Risk remains"), EventTag::Alarm);
    }

    #[test]
    fn test_priority_between_non_alarm_tags() {
        assert_eq!(
            classify("Motion detected then Motion stopped"),
            EventTag::MotionStopped
        );
        assert_eq!(
            classify("System Initialized; Motion detected"),
            EventTag::MotionStarted
        );
    }

    #[test]
    fn test_custom_patterns_from_yaml() {
        let patterns: PatternSet = serde_yaml::from_str(
            r#"
alarm: ["FIRE", ""]
motion_started: ["PIR HIGH"]
"#,
        )
        .unwrap();

        assert_eq!(patterns.classify("FIRE in kitchen"), EventTag::Alarm);
        assert_eq!(patterns.classify("PIR HIGH"), EventTag::MotionStarted);
        // Groups left out keep their defaults
        assert_eq!(patterns.classify("Motion stopped"), EventTag::MotionStopped);
        // Replaced group no longer knows the old words
        assert_eq!(patterns.classify("DANGER"), EventTag::Unclassified);
        // Empty pattern does not match everything
        assert_eq!(patterns.classify("idle"), EventTag::Unclassified);
    }
}
