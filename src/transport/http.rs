use super::PeerClient;
use super::protocol::{
    ENDPOINT_CLUSTER_STATE, ENDPOINT_COUNTER_UPDATE, ENDPOINT_HEARTBEAT, ENDPOINT_POLL_STATE,
};
use crate::counter::types::{ClusterCounterState, CounterUpdate, PollCounterState};

use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use reqwest::Url;
use std::time::Duration;

/// Per-call bounds for each kind of inter-node request. None of them is
/// retried; the next scheduled tick is the retry.
#[derive(Debug, Clone, Copy)]
pub struct Timeouts {
    pub push: Duration,
    pub pull: Duration,
    pub heartbeat: Duration,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            push: Duration::from_millis(1500),
            pull: Duration::from_secs(2),
            heartbeat: Duration::from_secs(1),
        }
    }
}

/// [`PeerClient`] speaking JSON over HTTP to other nodes' axum routers.
pub struct HttpPeerClient {
    http_client: reqwest::Client,
    timeouts: Timeouts,
}

impl HttpPeerClient {
    pub fn new(timeouts: Timeouts) -> Self {
        Self {
            http_client: reqwest::Client::new(),
            timeouts,
        }
    }

    fn url(peer: &str, path: &str) -> String {
        format!("{}{}", peer.trim_end_matches('/'), path)
    }

    /// `{peer}/internal/state/{poll_id}` with the poll id percent-encoded as a
    /// single path segment, so ids containing `/`, `?` or spaces address the
    /// same poll on the peer.
    fn poll_state_url(peer: &str, poll_id: &str) -> Result<Url> {
        let mut url =
            Url::parse(peer).with_context(|| format!("invalid peer address {}", peer))?;
        url.path_segments_mut()
            .map_err(|_| anyhow!("peer address {} cannot carry a path", peer))?
            .pop_if_empty()
            .extend(ENDPOINT_POLL_STATE.split('/').filter(|s| !s.is_empty()))
            .push(poll_id);
        Ok(url)
    }
}

#[async_trait]
impl PeerClient for HttpPeerClient {
    async fn push_update(&self, peer: &str, update: &CounterUpdate) -> Result<()> {
        let response = self
            .http_client
            .post(Self::url(peer, ENDPOINT_COUNTER_UPDATE))
            .json(update)
            .timeout(self.timeouts.push)
            .send()
            .await
            .with_context(|| format!("push to {} failed", peer))?;

        if !response.status().is_success() {
            anyhow::bail!("push to {} rejected: {}", peer, response.status());
        }
        Ok(())
    }

    async fn fetch_poll_state(&self, peer: &str, poll_id: &str) -> Result<PollCounterState> {
        let url = Self::poll_state_url(peer, poll_id)?;
        let response = self
            .http_client
            .get(url)
            .timeout(self.timeouts.pull)
            .send()
            .await
            .with_context(|| format!("poll state request to {} failed", peer))?;

        if !response.status().is_success() {
            anyhow::bail!("poll state request to {} failed: {}", peer, response.status());
        }

        let state = response
            .json::<PollCounterState>()
            .await
            .with_context(|| format!("malformed poll state from {}", peer))?;
        Ok(state)
    }

    async fn fetch_cluster_state(&self, peer: &str) -> Result<ClusterCounterState> {
        let response = self
            .http_client
            .get(Self::url(peer, ENDPOINT_CLUSTER_STATE))
            .timeout(self.timeouts.pull)
            .send()
            .await
            .with_context(|| format!("cluster state request to {} failed", peer))?;

        if !response.status().is_success() {
            anyhow::bail!(
                "cluster state request to {} failed: {}",
                peer,
                response.status()
            );
        }

        let state = response
            .json::<ClusterCounterState>()
            .await
            .with_context(|| format!("malformed cluster state from {}", peer))?;
        Ok(state)
    }

    async fn send_heartbeat(&self, peer: &str, sender: &str) -> Result<()> {
        let response = self
            .http_client
            .post(Self::url(peer, ENDPOINT_HEARTBEAT))
            .query(&[("sender", sender)])
            .timeout(self.timeouts.heartbeat)
            .send()
            .await
            .with_context(|| format!("heartbeat to {} failed", peer))?;

        if !response.status().is_success() {
            anyhow::bail!("heartbeat to {} rejected: {}", peer, response.status());
        }
        Ok(())
    }
}
