//! Node assembly: builds the store, replication engine and failure detector
//! from a [`NodeConfig`], exposes them over HTTP and runs the background loops.

use crate::config::NodeConfig;
use crate::counter::handlers::*;
use crate::counter::store::CounterStore;
use crate::failure::detector::FailureDetector;
use crate::failure::handlers::{handle_heartbeat, handle_status};
use crate::replication::engine::ReplicationEngine;
use crate::replication::handlers::{handle_sync_cluster, handle_sync_poll};
use crate::transport::PeerClient;
use crate::transport::http::HttpPeerClient;
use crate::transport::protocol::*;

use anyhow::Result;
use axum::{
    Router,
    extract::Extension,
    routing::{get, post},
};
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;

pub struct Node {
    pub config: NodeConfig,
    pub store: Arc<CounterStore>,
    pub engine: Arc<ReplicationEngine>,
    pub detector: Arc<FailureDetector>,
}

impl Node {
    pub fn new(config: NodeConfig) -> Self {
        let client = Arc::new(HttpPeerClient::new(config.timeouts));
        Self::with_client(config, client)
    }

    pub fn with_client(config: NodeConfig, client: Arc<dyn PeerClient>) -> Self {
        let store = Arc::new(CounterStore::new(config.node_id.clone()));
        let engine = Arc::new(ReplicationEngine::new(
            store.clone(),
            config.peers.clone(),
            client.clone(),
            config.replication,
        ));
        let detector = Arc::new(FailureDetector::new(
            config.advertise_url.clone(),
            config.peers.clone(),
            config.detector,
            client,
        ));

        Self {
            config,
            store,
            engine,
            detector,
        }
    }

    pub fn router(&self) -> Router {
        Router::new()
            .route(ENDPOINT_VOTE, post(handle_vote))
            .route(&format!("{}/:poll_id", ENDPOINT_POLL), get(handle_get_poll))
            .route(ENDPOINT_STATUS, get(handle_status))
            .route(ENDPOINT_COUNTER_UPDATE, post(handle_counter_update))
            .route(
                &format!("{}/:poll_id", ENDPOINT_POLL_STATE),
                get(handle_poll_state),
            )
            .route(
                &format!("{}/:poll_id", ENDPOINT_POLL_MERGE),
                post(handle_poll_merge),
            )
            .route(ENDPOINT_CLUSTER_STATE, get(handle_cluster_state))
            .route(ENDPOINT_CLUSTER_MERGE, post(handle_cluster_merge))
            .route(ENDPOINT_SYNC, post(handle_sync_cluster))
            .route(&format!("{}/:poll_id", ENDPOINT_SYNC), post(handle_sync_poll))
            .route(ENDPOINT_HEARTBEAT, post(handle_heartbeat))
            .layer(Extension(self.store.clone()))
            .layer(Extension(self.engine.clone()))
            .layer(Extension(self.detector.clone()))
            .layer(Extension(self.config.node_id.clone()))
    }

    /// Starts the anti-entropy and heartbeat loops. Both stop at the next
    /// tick after `shutdown` fires.
    pub fn spawn_background(&self, shutdown: &broadcast::Sender<()>) -> Vec<JoinHandle<()>> {
        let engine = self.engine.clone();
        let anti_entropy = tokio::spawn(engine.run_anti_entropy_loop(shutdown.subscribe()));

        let detector = self.detector.clone();
        let heartbeat = tokio::spawn(detector.run_heartbeat_loop(shutdown.subscribe()));

        vec![anti_entropy, heartbeat]
    }

    /// Serves HTTP on `listener` and runs the background loops until
    /// `shutdown` fires, then waits for everything to wind down.
    pub async fn serve(self, listener: TcpListener, shutdown: broadcast::Sender<()>) -> Result<()> {
        let mut http_shutdown = shutdown.subscribe();
        let background = self.spawn_background(&shutdown);
        let app = self.router();

        tracing::info!(
            "Node {} serving HTTP on {}",
            self.config.node_id,
            listener.local_addr()?
        );

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = http_shutdown.recv().await;
            })
            .await?;

        for handle in background {
            if let Err(e) = handle.await {
                tracing::warn!("Background task ended abnormally: {}", e);
            }
        }

        tracing::info!("Node {} stopped", self.config.node_id);
        Ok(())
    }
}
