use super::types::{DetectorConfig, HeartbeatReceipt, PeerState, PeerStatus};
use crate::transport::{FanOutReport, PeerClient, fan_out};

use dashmap::DashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::info;

/// Heartbeat-driven liveness tracking for the statically configured peers.
///
/// The health table is created once from the peer list and never grows:
/// heartbeats from addresses that do not resolve to a configured peer are
/// acknowledged but not recorded.
pub struct FailureDetector {
    self_addr: String,
    peers: Vec<String>,
    last_seen: DashMap<String, Option<Instant>>,
    config: DetectorConfig,
    client: Arc<dyn PeerClient>,
}

impl FailureDetector {
    pub fn new(
        self_addr: String,
        peers: Vec<String>,
        config: DetectorConfig,
        client: Arc<dyn PeerClient>,
    ) -> Self {
        let last_seen = peers.iter().map(|peer| (peer.clone(), None)).collect();
        Self {
            self_addr,
            peers,
            last_seen,
            config,
            client,
        }
    }

    /// Resolves a heartbeat sender to a configured peer address.
    ///
    /// A sender that already carries a port is returned as is. A sender
    /// without one (`http://node2`) is matched against the peer list by prefix
    /// (`http://node2:8002`). Anything else is returned unchanged.
    pub fn normalize_sender(&self, sender: &str) -> String {
        let sender = sender.trim();
        let host = sender
            .strip_prefix("http://")
            .or_else(|| sender.strip_prefix("https://"))
            .unwrap_or(sender);

        if host.contains(':') {
            return sender.to_string();
        }

        let prefix = format!("{}:", sender);
        self.peers
            .iter()
            .find(|peer| peer.starts_with(&prefix))
            .cloned()
            .unwrap_or_else(|| sender.to_string())
    }

    /// Records a heartbeat from `sender` if it is a configured peer.
    pub fn receive_heartbeat(&self, sender: &str) -> HeartbeatReceipt {
        let now = Instant::now();
        let received_from = self.normalize_sender(sender);

        let Some(mut last_seen) = self.last_seen.get_mut(&received_from) else {
            tracing::debug!("Ignoring heartbeat from unknown sender {}", received_from);
            return HeartbeatReceipt {
                received_from,
                tracked: false,
            };
        };

        let previous = *last_seen;
        *last_seen = Some(now);
        drop(last_seen);

        let previous_state = self.classify(previous.map(|at| now.saturating_duration_since(at)));
        if previous_state != PeerState::Alive {
            info!("Peer {} is ALIVE (was {:?})", received_from, previous_state);
        }

        HeartbeatReceipt {
            received_from,
            tracked: true,
        }
    }

    /// Current state of every configured peer, in configuration order.
    pub fn status_snapshot(&self) -> Vec<PeerStatus> {
        let now = Instant::now();

        self.peers
            .iter()
            .map(|peer| {
                let last_seen = self.last_seen.get(peer).and_then(|entry| *entry.value());
                let age = last_seen.map(|at| now.saturating_duration_since(at));

                PeerStatus {
                    peer: peer.clone(),
                    state: self.classify(age),
                    last_seen_seconds_ago: age.map(round_seconds),
                }
            })
            .collect()
    }

    pub fn peer_state(&self, peer: &str) -> Option<PeerState> {
        let now = Instant::now();
        self.last_seen
            .get(peer)
            .map(|entry| self.classify(entry.value().map(|at| now.saturating_duration_since(at))))
    }

    fn classify(&self, age: Option<Duration>) -> PeerState {
        PeerState::classify(age, self.config.suspect_timeout, self.config.dead_timeout)
    }

    /// Sends one heartbeat to every configured peer.
    pub async fn broadcast_heartbeat(&self) -> FanOutReport {
        fan_out(&self.peers, "heartbeat", |peer| {
            let client = self.client.clone();
            let sender = self.self_addr.clone();
            async move { client.send_heartbeat(&peer, &sender).await }
        })
        .await
    }

    /// Broadcasts heartbeats every `heartbeat_interval` until `shutdown` fires.
    ///
    /// Send failures are not handled here: a peer that is really down stops
    /// heartbeating us and ages into SUSPECT and DEAD on its own.
    pub async fn run_heartbeat_loop(self: Arc<Self>, mut shutdown: broadcast::Receiver<()>) {
        if self.peers.is_empty() {
            info!("No peers configured, heartbeat loop idle");
            let _ = shutdown.recv().await;
            return;
        }

        info!(
            "Starting heartbeat loop to {} peer(s) every {:?}",
            self.peers.len(),
            self.config.heartbeat_interval
        );
        let mut interval = tokio::time::interval(self.config.heartbeat_interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    let report = self.broadcast_heartbeat().await;
                    tracing::trace!("Heartbeat round: {:?}", report);
                }
                _ = shutdown.recv() => {
                    info!("Heartbeat loop stopped");
                    break;
                }
            }
        }
    }
}

fn round_seconds(age: Duration) -> f64 {
    (age.as_secs_f64() * 100.0).round() / 100.0
}
