//! Alert episode state machine.
//!
//! Debouncing is driven by tags, not timers: the first alarm line of an
//! episode asks for a dispatch, every further alarm line is suppressed until
//! a motion-stopped or system-reset line re-arms the machine.
//!
//! The machine performs no I/O. The monitor carries out the returned
//! [`Action`].

use serde::{Deserialize, Serialize};

use crate::domain::EventTag;

/// Whether an alert has already gone out for the current episode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EpisodeState {
    /// No alert sent yet
    Armed,

    /// Burst already dispatched
    Alerted,
}

impl Default for EpisodeState {
    fn default() -> Self {
        Self::Armed
    }
}

/// Side effect requested by a transition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    None,

    /// Take a snapshot and keep it as the latest handle
    CaptureSnapshot,

    /// Send the alert burst for a newly opened episode
    Dispatch { episode: u64 },

    /// Alarm repeated inside an episode that already alerted
    Suppress { episode: u64 },

    /// Back to `Armed`; `closed` names the episode that ended, if any
    Rearm { closed: Option<u64> },
}

/// State machine owned by the monitoring loop
#[derive(Debug, Clone, Default)]
pub struct AlertEpisode {
    state: EpisodeState,

    /// Bursts dispatched so far; doubles as the current episode number
    episodes: u64,
}

impl AlertEpisode {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> EpisodeState {
        self.state
    }

    pub fn is_alerted(&self) -> bool {
        self.state == EpisodeState::Alerted
    }

    /// Number of episodes that have dispatched
    pub fn episodes(&self) -> u64 {
        self.episodes
    }

    /// Apply one tag.
    ///
    /// On `Dispatch` the state is already `Alerted` when this returns, so an
    /// alarm arriving while the burst is in flight is suppressed.
    pub fn step(&mut self, tag: EventTag) -> Action {
        let (next, action) = transition(self.state, tag, self.episodes);
        if let Action::Dispatch { episode } = action {
            self.episodes = episode;
        }
        self.state = next;
        action
    }
}

fn transition(state: EpisodeState, tag: EventTag, episodes: u64) -> (EpisodeState, Action) {
    match (state, tag) {
        (EpisodeState::Armed, EventTag::Alarm) => (
            EpisodeState::Alerted,
            Action::Dispatch {
                episode: episodes + 1,
            },
        ),
        (EpisodeState::Alerted, EventTag::Alarm) => (
            EpisodeState::Alerted,
            Action::Suppress { episode: episodes },
        ),
        (EpisodeState::Alerted, EventTag::MotionStopped | EventTag::SystemReset) => (
            EpisodeState::Armed,
            Action::Rearm {
                closed: Some(episodes),
            },
        ),
        (EpisodeState::Armed, EventTag::MotionStopped | EventTag::SystemReset) => {
            (EpisodeState::Armed, Action::Rearm { closed: None })
        }
        (state, EventTag::MotionStarted) => (state, Action::CaptureSnapshot),
        (state, EventTag::Unclassified) => (state, Action::None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn armed_alarm_dispatches() {
        let (next, action) = transition(EpisodeState::Armed, EventTag::Alarm, 0);

        assert_eq!(next, EpisodeState::Alerted);
        assert_eq!(action, Action::Dispatch { episode: 1 });
    }

    #[test]
    fn alerted_alarm_is_suppressed() {
        let (next, action) = transition(EpisodeState::Alerted, EventTag::Alarm, 4);

        assert_eq!(next, EpisodeState::Alerted);
        assert_eq!(action, Action::Suppress { episode: 4 });
    }

    #[test]
    fn reset_tags_rearm_from_any_state() {
        for tag in [EventTag::MotionStopped, EventTag::SystemReset] {
            let (next, action) = transition(EpisodeState::Alerted, tag, 2);
            assert_eq!(next, EpisodeState::Armed);
            assert_eq!(action, Action::Rearm { closed: Some(2) });

            let (next, action) = transition(EpisodeState::Armed, tag, 2);
            assert_eq!(next, EpisodeState::Armed);
            assert_eq!(action, Action::Rearm { closed: None });
        }
    }

    #[test]
    fn motion_started_keeps_state() {
        for state in [EpisodeState::Armed, EpisodeState::Alerted] {
            let (next, action) = transition(state, EventTag::MotionStarted, 0);
            assert_eq!(next, state);
            assert_eq!(action, Action::CaptureSnapshot);

            let (next, action) = transition(state, EventTag::Unclassified, 0);
            assert_eq!(next, state);
            assert_eq!(action, Action::None);
        }
    }

    #[test]
    fn repeated_alarms_dispatch_once() {
        let mut episode = AlertEpisode::new();
        let actions: Vec<Action> = (0..5).map(|_| episode.step(EventTag::Alarm)).collect();

        assert_eq!(actions[0], Action::Dispatch { episode: 1 });
        assert!(actions[1..]
            .iter()
            .all(|a| *a == Action::Suppress { episode: 1 }));
        assert!(episode.is_alerted());
        assert_eq!(episode.episodes(), 1);
    }

    #[test]
    fn episode_numbers_increase_after_rearm() {
        let mut episode = AlertEpisode::new();

        assert_eq!(episode.step(EventTag::Alarm), Action::Dispatch { episode: 1 });
        assert_eq!(
            episode.step(EventTag::MotionStopped),
            Action::Rearm { closed: Some(1) }
        );
        assert_eq!(episode.state(), EpisodeState::Armed);
        assert_eq!(episode.step(EventTag::Alarm), Action::Dispatch { episode: 2 });
        assert_eq!(episode.episodes(), 2);
    }
}
