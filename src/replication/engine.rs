use super::types::{ReplicationConfig, SyncError};
use crate::counter::store::CounterStore;
use crate::counter::types::CounterUpdate;
use crate::transport::{FanOutReport, PeerClient, fan_out};

use anyhow::Result;
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use std::sync::{Arc, Mutex};
use tokio::sync::broadcast;
use tokio::time::MissedTickBehavior;
use tracing::{info, warn};

/// Spreads local increments to peers and repairs divergence.
///
/// Two paths feed the same idempotent merge:
/// - **Push**: every increment is sent to all peers once, best effort.
/// - **Anti-entropy**: on a fixed interval one random peer's full state is
///   pulled and merged. This alone guarantees convergence when pushes are
///   lost, as long as peers are eventually reachable.
pub struct ReplicationEngine {
    store: Arc<CounterStore>,
    peers: Vec<String>,
    client: Arc<dyn PeerClient>,
    rng: Mutex<StdRng>,
    config: ReplicationConfig,
}

impl ReplicationEngine {
    pub fn new(
        store: Arc<CounterStore>,
        peers: Vec<String>,
        client: Arc<dyn PeerClient>,
        config: ReplicationConfig,
    ) -> Self {
        Self::with_rng(store, peers, client, config, StdRng::from_entropy())
    }

    /// Same as [`ReplicationEngine::new`] with a caller-supplied random source
    /// for anti-entropy peer selection.
    pub fn with_rng(
        store: Arc<CounterStore>,
        peers: Vec<String>,
        client: Arc<dyn PeerClient>,
        config: ReplicationConfig,
        rng: StdRng,
    ) -> Self {
        Self {
            store,
            peers,
            client,
            rng: Mutex::new(rng),
            config,
        }
    }

    /// Sends `update` to every peer concurrently. Failures are counted and
    /// dropped; anti-entropy repairs whatever did not arrive.
    pub async fn push_update(&self, update: &CounterUpdate) -> FanOutReport {
        let report = fan_out(&self.peers, "push", |peer| {
            let client = self.client.clone();
            let update = update.clone();
            async move { client.push_update(&peer, &update).await }
        })
        .await;

        tracing::debug!(
            "Pushed {}/{}={} from {}: {} delivered, {} failed",
            update.poll_id,
            update.option,
            update.value,
            update.node_id,
            report.delivered,
            report.failed
        );
        report
    }

    fn pick_random_peer(&self) -> Option<String> {
        let mut rng = self.rng.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        self.peers.choose(&mut *rng).cloned()
    }

    /// One anti-entropy exchange: pull a random peer's cluster state and merge
    /// it. Returns the peer and whether local state grew, or `None` when no
    /// peers are configured.
    pub async fn anti_entropy_round(&self) -> Result<Option<(String, bool)>> {
        let Some(peer) = self.pick_random_peer() else {
            return Ok(None);
        };

        let remote = self.client.fetch_cluster_state(&peer).await?;
        let changed = self.store.merge_cluster_state(&remote);
        Ok(Some((peer, changed)))
    }

    /// Runs anti-entropy every `anti_entropy_interval` until `shutdown` fires.
    /// Failed rounds are logged and skipped; the next tick is the retry.
    pub async fn run_anti_entropy_loop(self: Arc<Self>, mut shutdown: broadcast::Receiver<()>) {
        if self.peers.is_empty() {
            info!("No peers configured, anti-entropy loop idle");
            let _ = shutdown.recv().await;
            return;
        }

        info!(
            "Starting anti-entropy loop over {} peer(s) every {:?}",
            self.peers.len(),
            self.config.anti_entropy_interval
        );
        let mut interval = tokio::time::interval(self.config.anti_entropy_interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    match self.anti_entropy_round().await {
                        Ok(Some((peer, true))) => {
                            info!("Anti-entropy: merged new state from {}", peer);
                        }
                        Ok(Some((peer, false))) => {
                            tracing::debug!("Anti-entropy: already in sync with {}", peer);
                        }
                        Ok(None) => {}
                        Err(e) => {
                            tracing::debug!("Anti-entropy round failed: {:#}", e);
                        }
                    }
                }
                _ = shutdown.recv() => {
                    info!("Anti-entropy loop stopped");
                    break;
                }
            }
        }
    }

    /// Pulls one poll from the first peer that answers and merges it.
    /// Returns the address synced from.
    pub async fn sync_poll(&self, poll_id: &str) -> Result<String, SyncError> {
        if self.peers.is_empty() {
            return Err(SyncError::NoPeersConfigured);
        }

        for peer in &self.peers {
            match self.client.fetch_poll_state(peer, poll_id).await {
                Ok(remote) => {
                    let changed = self.store.merge_poll_state(poll_id, &remote);
                    info!("Synced poll {} from {} (changed={})", poll_id, peer, changed);
                    return Ok(peer.clone());
                }
                Err(e) => {
                    tracing::debug!("Sync of poll {} from {} failed: {:#}", poll_id, peer, e);
                }
            }
        }

        warn!("Sync of poll {} failed: no peer reachable", poll_id);
        Err(SyncError::NoPeerReachable)
    }

    /// Pulls the whole cluster state from the first peer that answers and
    /// merges it.
    pub async fn sync_cluster(&self) -> Result<String, SyncError> {
        if self.peers.is_empty() {
            return Err(SyncError::NoPeersConfigured);
        }

        for peer in &self.peers {
            match self.client.fetch_cluster_state(peer).await {
                Ok(remote) => {
                    let changed = self.store.merge_cluster_state(&remote);
                    info!("Synced cluster state from {} (changed={})", peer, changed);
                    return Ok(peer.clone());
                }
                Err(e) => {
                    tracing::debug!("Cluster sync from {} failed: {:#}", peer, e);
                }
            }
        }

        warn!("Cluster sync failed: no peer reachable");
        Err(SyncError::NoPeerReachable)
    }
}
