use super::types::{ClusterCounterState, CounterUpdate, NodeId, PollCounterState};

use dashmap::DashMap;
use std::collections::BTreeMap;

/// In-memory G-Counter store for every poll on this node.
///
/// Each poll lives behind one `DashMap` entry, so all reads and writes of a
/// poll's nested maps happen under that entry's lock. Increments on the same
/// (poll, option) are serialized and per-poll exports are never torn.
pub struct CounterStore {
    node_id: NodeId,
    polls: DashMap<String, PollCounterState>,
}

impl CounterStore {
    pub fn new(node_id: NodeId) -> Self {
        Self {
            node_id,
            polls: DashMap::new(),
        }
    }

    pub fn node_id(&self) -> &NodeId {
        &self.node_id
    }

    /// Increments this node's own component for `(poll_id, option)` and
    /// returns the update describing its new absolute value.
    pub fn increment(&self, poll_id: &str, option: &str) -> CounterUpdate {
        let mut poll = self.polls.entry(poll_id.to_string()).or_default();
        let slot = poll
            .counts
            .entry(option.to_string())
            .or_default()
            .entry(self.node_id.clone())
            .or_insert(0);
        *slot = slot.saturating_add(1);

        CounterUpdate {
            poll_id: poll_id.to_string(),
            option: option.to_string(),
            node_id: self.node_id.clone(),
            value: *slot,
        }
    }

    /// Applies one component with `max()`. Returns whether the local value
    /// increased.
    pub fn merge_component(&self, update: &CounterUpdate) -> bool {
        let mut poll = self.polls.entry(update.poll_id.clone()).or_default();
        poll.merge_component(&update.option, &update.node_id, update.value)
    }

    pub fn export_poll_state(&self, poll_id: &str) -> PollCounterState {
        self.polls
            .get(poll_id)
            .map(|poll| poll.value().clone())
            .unwrap_or_default()
    }

    pub fn export_cluster_state(&self) -> ClusterCounterState {
        let polls = self
            .polls
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().clone()))
            .collect();
        ClusterCounterState { polls }
    }

    pub fn merge_poll_state(&self, poll_id: &str, other: &PollCounterState) -> bool {
        let mut poll = self.polls.entry(poll_id.to_string()).or_default();
        poll.merge(other)
    }

    pub fn merge_cluster_state(&self, other: &ClusterCounterState) -> bool {
        let mut changed = false;
        for (poll_id, state) in &other.polls {
            changed |= self.merge_poll_state(poll_id, state);
        }
        changed
    }

    /// Summed count per option. Unknown polls read as empty.
    pub fn query_aggregate(&self, poll_id: &str) -> BTreeMap<String, u64> {
        self.polls
            .get(poll_id)
            .map(|poll| poll.totals())
            .unwrap_or_default()
    }

    pub fn poll_count(&self) -> usize {
        self.polls.len()
    }
}
