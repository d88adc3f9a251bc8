use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Liveness classification of a configured peer.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PeerState {
    /// No heartbeat received since this process started.
    Unknown,
    Alive,
    Suspect,
    Dead,
}

impl PeerState {
    /// Maps the time since the last heartbeat onto a state. Both thresholds
    /// are inclusive upper bounds of the milder state.
    pub fn classify(age: Option<Duration>, suspect_timeout: Duration, dead_timeout: Duration) -> Self {
        match age {
            None => PeerState::Unknown,
            Some(age) if age <= suspect_timeout => PeerState::Alive,
            Some(age) if age <= dead_timeout => PeerState::Suspect,
            Some(_) => PeerState::Dead,
        }
    }
}

/// Thresholds and pacing for the heartbeat detector.
#[derive(Debug, Clone, Copy)]
pub struct DetectorConfig {
    pub heartbeat_interval: Duration,
    pub suspect_timeout: Duration,
    pub dead_timeout: Duration,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            heartbeat_interval: Duration::from_secs(1),
            suspect_timeout: Duration::from_secs(3),
            dead_timeout: Duration::from_secs(6),
        }
    }
}

/// One row of the peer health table as reported by `GET /status`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PeerStatus {
    pub peer: String,
    pub state: PeerState,
    /// Seconds since the last heartbeat, rounded to two decimals. `None` until
    /// the first heartbeat arrives.
    pub last_seen_seconds_ago: Option<f64>,
}

/// What `receive_heartbeat` did with a sender address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeartbeatReceipt {
    pub received_from: String,
    pub tracked: bool,
}
