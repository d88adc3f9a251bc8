use std::time::Duration;
use thiserror::Error;

/// Why a manual sync could not complete. Both variants mean the caller asked
/// for a recovery action that did not happen.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SyncError {
    #[error("No peers configured")]
    NoPeersConfigured,
    #[error("No peer reachable for sync")]
    NoPeerReachable,
}

#[derive(Debug, Clone, Copy)]
pub struct ReplicationConfig {
    pub anti_entropy_interval: Duration,
}

impl Default for ReplicationConfig {
    fn default() -> Self {
        Self {
            anti_entropy_interval: Duration::from_secs(5),
        }
    }
}
