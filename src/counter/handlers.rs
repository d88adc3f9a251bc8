use axum::{
    Json,
    extract::{Extension, Path},
    http::StatusCode,
};
use std::sync::Arc;

use super::store::CounterStore;
use super::types::{ClusterCounterState, CounterUpdate, PollCounterState};
use crate::replication::engine::ReplicationEngine;
use crate::transport::protocol::{MergeResponse, PollCountsResponse, VoteRequest, VoteResponse};

/// Counts the vote locally, then pushes the new component value to every
/// peer. Always succeeds once the local increment is done.
pub async fn handle_vote(
    Extension(store): Extension<Arc<CounterStore>>,
    Extension(engine): Extension<Arc<ReplicationEngine>>,
    Json(req): Json<VoteRequest>,
) -> (StatusCode, Json<VoteResponse>) {
    let update = store.increment(&req.poll_id, &req.option);
    tracing::info!(
        "Vote for {}/{} (local component now {})",
        update.poll_id,
        update.option,
        update.value
    );

    engine.push_update(&update).await;

    (
        StatusCode::OK,
        Json(VoteResponse {
            ok: true,
            node: store.node_id().clone(),
            update,
        }),
    )
}

pub async fn handle_get_poll(
    Extension(store): Extension<Arc<CounterStore>>,
    Path(poll_id): Path<String>,
) -> Json<PollCountsResponse> {
    let counts = store.query_aggregate(&poll_id);

    Json(PollCountsResponse {
        poll_id,
        counts,
        node: store.node_id().clone(),
    })
}

pub async fn handle_counter_update(
    Extension(store): Extension<Arc<CounterStore>>,
    Json(update): Json<CounterUpdate>,
) -> Json<MergeResponse> {
    let changed = store.merge_component(&update);
    if changed {
        tracing::debug!(
            "Merged pushed component {}/{}/{} = {}",
            update.poll_id,
            update.option,
            update.node_id,
            update.value
        );
    }

    Json(MergeResponse {
        ok: true,
        changed,
        node: store.node_id().clone(),
    })
}

pub async fn handle_poll_state(
    Extension(store): Extension<Arc<CounterStore>>,
    Path(poll_id): Path<String>,
) -> Json<PollCounterState> {
    Json(store.export_poll_state(&poll_id))
}

pub async fn handle_poll_merge(
    Extension(store): Extension<Arc<CounterStore>>,
    Path(poll_id): Path<String>,
    Json(other): Json<PollCounterState>,
) -> Json<MergeResponse> {
    let changed = store.merge_poll_state(&poll_id, &other);

    Json(MergeResponse {
        ok: true,
        changed,
        node: store.node_id().clone(),
    })
}

pub async fn handle_cluster_state(
    Extension(store): Extension<Arc<CounterStore>>,
) -> Json<ClusterCounterState> {
    Json(store.export_cluster_state())
}

pub async fn handle_cluster_merge(
    Extension(store): Extension<Arc<CounterStore>>,
    Json(other): Json<ClusterCounterState>,
) -> Json<MergeResponse> {
    let changed = store.merge_cluster_state(&other);
    if changed {
        tracing::debug!("Merged pushed cluster snapshot ({} polls)", other.polls.len());
    }

    Json(MergeResponse {
        ok: true,
        changed,
        node: store.node_id().clone(),
    })
}
