//! Node configuration, read once from the environment at startup.

use crate::counter::types::NodeId;
use crate::failure::types::DetectorConfig;
use crate::replication::types::ReplicationConfig;
use crate::transport::http::Timeouts;

use anyhow::{Context, Result};
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct NodeConfig {
    pub node_id: NodeId,
    pub bind_host: IpAddr,
    pub port: u16,
    /// Address this node announces in heartbeats. Peers must list this exact
    /// string (or the same host without a port) to track us.
    pub advertise_url: String,
    pub peers: Vec<String>,
    pub detector: DetectorConfig,
    pub replication: ReplicationConfig,
    pub timeouts: Timeouts,
}

impl NodeConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from any key/value source. Unset keys fall
    /// back to their defaults; set but unparsable values are errors.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let node_id = match lookup("NODE_ID").map(|v| v.trim().to_string()) {
            Some(id) if !id.is_empty() => NodeId(id),
            _ => NodeId::new(),
        };

        let bind_host = match lookup("BIND_HOST") {
            Some(raw) => raw
                .trim()
                .parse()
                .with_context(|| format!("invalid BIND_HOST {:?}", raw))?,
            None => IpAddr::from([0, 0, 0, 0]),
        };

        let port = match lookup("PORT") {
            Some(raw) => raw
                .trim()
                .parse()
                .with_context(|| format!("invalid PORT {:?}", raw))?,
            None => 8000,
        };

        let advertise_url = lookup("ADVERTISE_URL")
            .map(|v| v.trim().trim_end_matches('/').to_string())
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| format!("http://{}:{}", node_id, port));

        let peers = parse_peers(&lookup("PEERS").unwrap_or_default());

        let detector = DetectorConfig {
            heartbeat_interval: seconds(&lookup, "HEARTBEAT_INTERVAL", 1.0)?,
            suspect_timeout: seconds(&lookup, "SUSPECT_TIMEOUT", 3.0)?,
            dead_timeout: seconds(&lookup, "DEAD_TIMEOUT", 6.0)?,
        };
        if detector.dead_timeout < detector.suspect_timeout {
            anyhow::bail!(
                "DEAD_TIMEOUT ({:?}) must not be shorter than SUSPECT_TIMEOUT ({:?})",
                detector.dead_timeout,
                detector.suspect_timeout
            );
        }

        let replication = ReplicationConfig {
            anti_entropy_interval: seconds(&lookup, "ANTI_ENTROPY_INTERVAL", 5.0)?,
        };

        let timeouts = Timeouts {
            push: seconds(&lookup, "PUSH_TIMEOUT", 1.5)?,
            pull: seconds(&lookup, "PULL_TIMEOUT", 2.0)?,
            heartbeat: seconds(&lookup, "HEARTBEAT_TIMEOUT", 1.0)?,
        };

        Ok(Self {
            node_id,
            bind_host,
            port,
            advertise_url,
            peers,
            detector,
            replication,
            timeouts,
        })
    }

    pub fn bind_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind_host, self.port)
    }
}

/// Splits a comma-separated peer list. Blank entries and duplicates are
/// dropped, order is kept.
pub fn parse_peers(raw: &str) -> Vec<String> {
    let mut peers: Vec<String> = Vec::new();
    for peer in raw.split(',') {
        let peer = peer.trim().trim_end_matches('/');
        if !peer.is_empty() && !peers.iter().any(|p| p == peer) {
            peers.push(peer.to_string());
        }
    }
    peers
}

fn seconds<F>(lookup: &F, key: &str, default: f64) -> Result<Duration>
where
    F: Fn(&str) -> Option<String>,
{
    let Some(raw) = lookup(key) else {
        return Ok(Duration::from_secs_f64(default));
    };

    let value: f64 = raw
        .trim()
        .parse()
        .with_context(|| format!("invalid {} {:?}: expected seconds", key, raw))?;
    if !value.is_finite() || value <= 0.0 {
        anyhow::bail!("{} must be a positive number of seconds, got {}", key, value);
    }
    Duration::try_from_secs_f64(value).with_context(|| format!("{} is out of range", key))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> Result<NodeConfig> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        NodeConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config(&[("NODE_ID", "node1")]).unwrap();

        assert_eq!(config.node_id, NodeId::from("node1"));
        assert_eq!(config.port, 8000);
        assert_eq!(config.bind_addr().to_string(), "0.0.0.0:8000");
        assert_eq!(config.advertise_url, "http://node1:8000");
        assert!(config.peers.is_empty());
        assert_eq!(config.detector.heartbeat_interval, Duration::from_secs(1));
        assert_eq!(config.detector.suspect_timeout, Duration::from_secs(3));
        assert_eq!(config.detector.dead_timeout, Duration::from_secs(6));
        assert_eq!(config.replication.anti_entropy_interval, Duration::from_secs(5));
        assert_eq!(config.timeouts.push, Duration::from_millis(1500));
    }

    #[test]
    fn test_missing_node_id_generates_one() {
        let a = config(&[]).unwrap();
        let b = config(&[]).unwrap();
        assert_ne!(a.node_id, b.node_id);
    }

    #[test]
    fn test_full_environment() {
        let config = config(&[
            ("NODE_ID", "node2"),
            ("PORT", "8002"),
            ("PEERS", "http://node1:8001, ,http://node3:8003/,http://node1:8001"),
            ("HEARTBEAT_INTERVAL", "0.5"),
            ("SUSPECT_TIMEOUT", "2"),
            ("DEAD_TIMEOUT", "4.5"),
            ("ANTI_ENTROPY_INTERVAL", "10"),
        ])
        .unwrap();

        assert_eq!(config.advertise_url, "http://node2:8002");
        assert_eq!(config.peers, vec!["http://node1:8001", "http://node3:8003"]);
        assert_eq!(config.detector.heartbeat_interval, Duration::from_millis(500));
        assert_eq!(config.detector.dead_timeout, Duration::from_millis(4500));
        assert_eq!(config.replication.anti_entropy_interval, Duration::from_secs(10));
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        assert!(config(&[("PORT", "eighty")]).is_err());
        assert!(config(&[("SUSPECT_TIMEOUT", "soon")]).is_err());
        assert!(config(&[("HEARTBEAT_INTERVAL", "0")]).is_err());
        assert!(config(&[("ANTI_ENTROPY_INTERVAL", "-1")]).is_err());
        assert!(config(&[("SUSPECT_TIMEOUT", "5"), ("DEAD_TIMEOUT", "2")]).is_err());
    }
}
