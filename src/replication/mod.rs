//! Replication Module
//!
//! Disseminates local increments and repairs divergence between replicas.
//!
//! ## Core Mechanisms
//! - **Push**: Each increment is fanned out to every peer concurrently under a short timeout.
//!   Delivery is at-most-once per call; lost pushes are not retried.
//! - **Anti-Entropy**: A background loop pulls the full cluster state from one random peer per
//!   tick and merges it. This is the convergence backstop for lost pushes, crashes and partitions.
//! - **Manual Sync**: On demand pull from the first reachable peer. Unlike the other paths, a
//!   failure here is reported to the caller (`503 Service Unavailable`).

pub mod engine;
pub mod handlers;
pub mod types;
