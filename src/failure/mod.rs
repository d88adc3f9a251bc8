//! Failure Detection Module
//!
//! Classifies the liveness of the statically configured peers from the time
//! elapsed since their last heartbeat.
//!
//! ## Core Mechanisms
//! - **Heartbeat loop**: Every node periodically announces its own address to every peer.
//! - **Graduated thresholds**: `UNKNOWN` until the first heartbeat, then `ALIVE` -> `SUSPECT` -> `DEAD`
//!   as the last heartbeat ages past the suspect and dead timeouts.
//! - **Reset on contact**: Any heartbeat moves a peer straight back to `ALIVE`.
//! - **Bounded table**: Only configured peers are tracked; unknown senders are acknowledged and ignored.

pub mod detector;
pub mod handlers;
pub mod types;
