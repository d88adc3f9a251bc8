use axum::{
    Json,
    extract::{Extension, Query},
    http::StatusCode,
};
use std::sync::Arc;

use super::detector::FailureDetector;
use crate::counter::types::NodeId;
use crate::transport::protocol::{HeartbeatParams, HeartbeatResponse, StatusResponse};

pub async fn handle_heartbeat(
    Extension(detector): Extension<Arc<FailureDetector>>,
    Extension(node): Extension<NodeId>,
    Query(params): Query<HeartbeatParams>,
) -> (StatusCode, Json<HeartbeatResponse>) {
    let receipt = detector.receive_heartbeat(&params.sender);

    (
        StatusCode::OK,
        Json(HeartbeatResponse {
            ok: true,
            node,
            received_from: receipt.received_from,
            tracked: receipt.tracked,
        }),
    )
}

pub async fn handle_status(
    Extension(detector): Extension<Arc<FailureDetector>>,
    Extension(node): Extension<NodeId>,
) -> Json<StatusResponse> {
    Json(StatusResponse {
        node,
        peers: detector.status_snapshot(),
    })
}
