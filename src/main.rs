use replicated_counter::config::NodeConfig;
use replicated_counter::failure::types::PeerState;
use replicated_counter::node::Node;
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::time::MissedTickBehavior;
use tracing_subscriber::EnvFilter;

const STATUS_REPORT_INTERVAL: Duration = Duration::from_secs(10);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = NodeConfig::from_env()?;

    tracing::info!("Starting node {} on {}", config.node_id, config.bind_addr());
    tracing::info!("Advertising as {}", config.advertise_url);
    if config.peers.is_empty() {
        tracing::info!("No peers configured, running standalone");
    } else {
        tracing::info!("Peers: {:?}", config.peers);
    }

    let bind_addr = config.bind_addr();
    let node = Node::new(config);
    let (shutdown_tx, _) = broadcast::channel(1);

    // 1. Ctrl+C triggers a cooperative shutdown:
    let signal_tx = shutdown_tx.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Shutdown requested");
            let _ = signal_tx.send(());
        }
    });

    // 2. Periodic peer health report:
    let detector = node.detector.clone();
    let mut report_shutdown = shutdown_tx.subscribe();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(STATUS_REPORT_INTERVAL);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    let peers = detector.status_snapshot();
                    let alive = peers.iter().filter(|p| p.state == PeerState::Alive).count();
                    tracing::info!("Cluster stats: {}/{} peers alive", alive, peers.len());
                    for peer in peers {
                        tracing::debug!(
                            "  - {} {:?} (last seen {:?}s ago)",
                            peer.peer,
                            peer.state,
                            peer.last_seen_seconds_ago
                        );
                    }
                }
                _ = report_shutdown.recv() => break,
            }
        }
    });

    // 3. HTTP server plus anti-entropy and heartbeat loops:
    let listener = tokio::net::TcpListener::bind(bind_addr).await?;
    tracing::info!("Press Ctrl+C to shutdown");
    node.serve(listener, shutdown_tx).await?;

    Ok(())
}
