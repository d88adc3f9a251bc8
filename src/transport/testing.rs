//! In-memory stand-in for the HTTP network, shared by unit tests.

use super::PeerClient;
use crate::counter::store::CounterStore;
use crate::counter::types::{ClusterCounterState, CounterUpdate, PollCounterState};
use crate::failure::detector::FailureDetector;

use anyhow::{Result, anyhow};
use async_trait::async_trait;
use dashmap::{DashMap, DashSet};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::Duration;

/// Routes calls directly into the target node's store or detector.
///
/// Peers can be taken down (every call fails) and a number of upcoming pushes
/// can be dropped to simulate message loss. The next cluster pull can be made
/// slow to stand in for a peer that answers near the timeout.
#[derive(Default)]
pub(crate) struct InMemoryNetwork {
    stores: DashMap<String, Arc<CounterStore>>,
    detectors: DashMap<String, Arc<FailureDetector>>,
    down: DashSet<String>,
    pushes_to_drop: AtomicUsize,
    pushes_delivered: AtomicUsize,
    next_pull_delay_ms: AtomicU64,
    cluster_pulls: AtomicUsize,
}

impl InMemoryNetwork {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn register_store(&self, addr: &str, store: Arc<CounterStore>) {
        self.stores.insert(addr.to_string(), store);
    }

    pub fn register_detector(&self, addr: &str, detector: Arc<FailureDetector>) {
        self.detectors.insert(addr.to_string(), detector);
    }

    pub fn take_down(&self, addr: &str) {
        self.down.insert(addr.to_string());
    }

    pub fn bring_up(&self, addr: &str) {
        self.down.remove(addr);
    }

    pub fn drop_next_pushes(&self, count: usize) {
        self.pushes_to_drop.store(count, Ordering::SeqCst);
    }

    pub fn pushes_delivered(&self) -> usize {
        self.pushes_delivered.load(Ordering::SeqCst)
    }

    pub fn slow_next_pull(&self, delay: Duration) {
        self.next_pull_delay_ms
            .store(delay.as_millis() as u64, Ordering::SeqCst);
    }

    pub fn cluster_pulls(&self) -> usize {
        self.cluster_pulls.load(Ordering::SeqCst)
    }

    fn store(&self, peer: &str) -> Result<Arc<CounterStore>> {
        if self.down.contains(peer) {
            return Err(anyhow!("{} is unreachable", peer));
        }
        self.stores
            .get(peer)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| anyhow!("no store registered at {}", peer))
    }
}

#[async_trait]
impl PeerClient for InMemoryNetwork {
    async fn push_update(&self, peer: &str, update: &CounterUpdate) -> Result<()> {
        let store = self.store(peer)?;
        let dropped = self
            .pushes_to_drop
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if dropped {
            return Err(anyhow!("push to {} lost in transit", peer));
        }
        store.merge_component(update);
        self.pushes_delivered.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn fetch_poll_state(&self, peer: &str, poll_id: &str) -> Result<PollCounterState> {
        Ok(self.store(peer)?.export_poll_state(poll_id))
    }

    async fn fetch_cluster_state(&self, peer: &str) -> Result<ClusterCounterState> {
        self.cluster_pulls.fetch_add(1, Ordering::SeqCst);
        let delay = self.next_pull_delay_ms.swap(0, Ordering::SeqCst);
        if delay > 0 {
            tokio::time::sleep(Duration::from_millis(delay)).await;
        }
        Ok(self.store(peer)?.export_cluster_state())
    }

    async fn send_heartbeat(&self, peer: &str, sender: &str) -> Result<()> {
        if self.down.contains(peer) {
            return Err(anyhow!("{} is unreachable", peer));
        }
        let detector = self
            .detectors
            .get(peer)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| anyhow!("no detector registered at {}", peer))?;
        detector.receive_heartbeat(sender);
        Ok(())
    }
}
