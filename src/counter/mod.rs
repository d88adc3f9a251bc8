//! Counter Store Module
//!
//! Holds the replicated vote counts as a grow-only counter (G-Counter) per
//! `(poll, option)`: one non-negative component per origin node.
//!
//! ## Core Concepts
//! - **Ownership**: A node only ever increments its own component. Everyone else only merges it.
//! - **Join**: Merging takes the per-component maximum. It is commutative, associative and
//!   idempotent, so replicas converge whatever the delivery order, duplication or loss.
//! - **Aggregate**: The count shown to clients is the sum of all node components.
//! - **Bounds**: Components are `u64`; increments and sums saturate at `u64::MAX`.

pub mod handlers;
pub mod store;
pub mod types;

#[cfg(test)]
mod tests;
