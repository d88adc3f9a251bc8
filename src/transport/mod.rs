//! Peer Transport Module
//!
//! The boundary between the replication/failure-detection logic and the
//! network. Every inter-node call goes through the [`PeerClient`] trait, so the
//! core can run against real HTTP peers or against an in-memory cluster in
//! tests.
//!
//! Peers are addressed by their base URL (e.g. `http://node2:8002`), exactly as
//! they appear in the configured peer list.

pub mod http;
pub mod protocol;

#[cfg(test)]
pub(crate) mod testing;

use crate::counter::types::{ClusterCounterState, CounterUpdate, PollCounterState};
use anyhow::Result;
use async_trait::async_trait;
use std::future::Future;
use tokio::task::JoinSet;

#[async_trait]
pub trait PeerClient: Send + Sync {
    /// Delivers one component update to `peer`.
    async fn push_update(&self, peer: &str, update: &CounterUpdate) -> Result<()>;

    async fn fetch_poll_state(&self, peer: &str, poll_id: &str) -> Result<PollCounterState>;

    async fn fetch_cluster_state(&self, peer: &str) -> Result<ClusterCounterState>;

    /// Tells `peer` that `sender` (this node's advertised address) is alive.
    async fn send_heartbeat(&self, peer: &str, sender: &str) -> Result<()>;
}

/// Outcome of one best-effort call to every peer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FanOutReport {
    pub delivered: usize,
    pub failed: usize,
}

/// Runs `call` against every peer concurrently and waits for all of them.
///
/// Individual failures are logged at debug level and counted, never returned.
/// Each call is expected to carry its own timeout.
pub async fn fan_out<F, Fut>(peers: &[String], label: &'static str, call: F) -> FanOutReport
where
    F: Fn(String) -> Fut,
    Fut: Future<Output = Result<()>> + Send + 'static,
{
    let mut tasks = JoinSet::new();
    for peer in peers {
        let request = call(peer.clone());
        let peer = peer.clone();
        tasks.spawn(async move { (peer, request.await) });
    }

    let mut report = FanOutReport::default();
    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok((_, Ok(()))) => report.delivered += 1,
            Ok((peer, Err(e))) => {
                tracing::debug!("{} to {} failed: {:#}", label, peer, e);
                report.failed += 1;
            }
            Err(e) => {
                tracing::warn!("{} task aborted: {}", label, e);
                report.failed += 1;
            }
        }
    }
    report
}
