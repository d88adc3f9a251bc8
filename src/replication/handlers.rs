use axum::{
    Json,
    extract::{Extension, Path},
    http::StatusCode,
};
use std::sync::Arc;

use super::engine::ReplicationEngine;
use super::types::SyncError;
use crate::counter::types::NodeId;
use crate::transport::protocol::{ErrorResponse, SyncResponse};

type SyncResult = Result<Json<SyncResponse>, (StatusCode, Json<ErrorResponse>)>;

pub async fn handle_sync_poll(
    Extension(engine): Extension<Arc<ReplicationEngine>>,
    Extension(node): Extension<NodeId>,
    Path(poll_id): Path<String>,
) -> SyncResult {
    let result = engine.sync_poll(&poll_id).await;
    sync_response(result, node)
}

pub async fn handle_sync_cluster(
    Extension(engine): Extension<Arc<ReplicationEngine>>,
    Extension(node): Extension<NodeId>,
) -> SyncResult {
    let result = engine.sync_cluster().await;
    sync_response(result, node)
}

fn sync_response(result: Result<String, SyncError>, node: NodeId) -> SyncResult {
    match result {
        Ok(synced_from) => Ok(Json(SyncResponse {
            ok: true,
            synced_from,
            node,
        })),
        Err(e) => Err((
            StatusCode::SERVICE_UNAVAILABLE,
            Json(ErrorResponse {
                detail: e.to_string(),
            }),
        )),
    }
}
