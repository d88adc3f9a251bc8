//! Replicated Counter Node Library
//!
//! Each node accepts votes locally and converges with its peers to the same
//! per-poll counts despite message loss, duplication, reordering and node
//! failure. The binary (`main.rs`) wires these modules into a running node.
//!
//! ## Architecture Modules
//! - **`counter`**: The replicated state. A grow-only counter per (poll, option, origin node)
//!   whose merge is a pointwise maximum, so any exchange order converges.
//! - **`replication`**: Best-effort push of each increment to all peers, plus a perpetual
//!   anti-entropy loop pulling full state from a random peer, plus on-demand manual sync.
//! - **`failure`**: Heartbeat-driven failure detector classifying peers as
//!   UNKNOWN / ALIVE / SUSPECT / DEAD.
//! - **`transport`**: The `PeerClient` seam and its HTTP implementation, plus the wire protocol.
//! - **`config`** and **`node`**: Environment configuration and process assembly.

pub mod config;
pub mod counter;
pub mod failure;
pub mod node;
pub mod replication;
pub mod transport;
