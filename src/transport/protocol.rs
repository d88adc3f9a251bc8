//! Node HTTP Protocol
//!
//! Endpoint paths and the request/response bodies exchanged between nodes and
//! with clients. All bodies are JSON.

use crate::counter::types::{CounterUpdate, NodeId};
use crate::failure::types::PeerStatus;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// --- API Endpoints ---

/// Public endpoint for submitting a vote.
pub const ENDPOINT_VOTE: &str = "/vote";
/// Public endpoint for reading a poll's aggregate counts.
pub const ENDPOINT_POLL: &str = "/poll";
/// Public endpoint for the peer health table.
pub const ENDPOINT_STATUS: &str = "/status";
/// Push target for a single component update.
pub const ENDPOINT_COUNTER_UPDATE: &str = "/internal/counter/update";
/// Full state of one poll (`GET {ENDPOINT_POLL_STATE}/{poll_id}`).
pub const ENDPOINT_POLL_STATE: &str = "/internal/state";
/// Merge a pushed poll snapshot (`POST {ENDPOINT_POLL_MERGE}/{poll_id}`).
pub const ENDPOINT_POLL_MERGE: &str = "/internal/merge";
/// Full state of every poll, pulled by anti-entropy.
pub const ENDPOINT_CLUSTER_STATE: &str = "/internal/cluster/state";
/// Merge a pushed cluster snapshot.
pub const ENDPOINT_CLUSTER_MERGE: &str = "/internal/cluster/merge";
/// Manual sync, whole cluster or `/{poll_id}`.
pub const ENDPOINT_SYNC: &str = "/internal/sync";
/// Liveness ping target (`?sender=<advertised url>`).
pub const ENDPOINT_HEARTBEAT: &str = "/internal/heartbeat";

// --- Data Transfer Objects ---

#[derive(Debug, Serialize, Deserialize)]
pub struct VoteRequest {
    pub poll_id: String,
    pub option: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct VoteResponse {
    pub ok: bool,
    pub node: NodeId,
    pub update: CounterUpdate,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PollCountsResponse {
    pub poll_id: String,
    pub counts: BTreeMap<String, u64>,
    pub node: NodeId,
}

/// Acknowledgement for update and merge calls. `changed` is true when the
/// receiving node's state actually grew.
#[derive(Debug, Serialize, Deserialize)]
pub struct MergeResponse {
    pub ok: bool,
    pub changed: bool,
    pub node: NodeId,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SyncResponse {
    pub ok: bool,
    pub synced_from: String,
    pub node: NodeId,
}

/// Body returned with a non-2xx status.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub detail: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HeartbeatParams {
    pub sender: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HeartbeatResponse {
    pub ok: bool,
    pub node: NodeId,
    pub received_from: String,
    pub tracked: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct StatusResponse {
    pub node: NodeId,
    pub peers: Vec<PeerStatus>,
}
