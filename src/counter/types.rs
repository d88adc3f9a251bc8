use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Identity of a replica. Only the node with this id ever increments
/// components tagged with it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(transparent)]
pub struct NodeId(pub String);

impl NodeId {
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }
}

impl Default for NodeId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for NodeId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// The absolute current value of one counter component.
///
/// Updates carry the value, not a delta, so the receiver can apply them with
/// `max()`. Receiving the same update twice, or an older one after a newer
/// one, leaves the receiver unchanged.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CounterUpdate {
    pub poll_id: String,
    pub option: String,
    pub node_id: NodeId,
    pub value: u64,
}

/// Full G-Counter state of one poll: `counts[option][node_id] = value`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct PollCounterState {
    pub counts: BTreeMap<String, BTreeMap<NodeId, u64>>,
}

impl PollCounterState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn component(&self, option: &str, node_id: &NodeId) -> u64 {
        self.counts
            .get(option)
            .and_then(|nodes| nodes.get(node_id))
            .copied()
            .unwrap_or(0)
    }

    /// Raises one component to `value` if it is larger. Returns whether the
    /// component changed.
    ///
    /// The option entry is created even when `value` is zero, so a merge
    /// always makes every referenced option visible locally.
    pub fn merge_component(&mut self, option: &str, node_id: &NodeId, value: u64) -> bool {
        let nodes = self.counts.entry(option.to_string()).or_default();
        raise(nodes, node_id, value)
    }

    /// Pointwise max with `other`. Returns whether any component increased.
    pub fn merge(&mut self, other: &PollCounterState) -> bool {
        let mut changed = false;
        for (option, nodes) in &other.counts {
            let local = self.counts.entry(option.clone()).or_default();
            for (node_id, value) in nodes {
                changed |= raise(local, node_id, *value);
            }
        }
        changed
    }

    /// Aggregate count per option: the sum over all node components.
    pub fn totals(&self) -> BTreeMap<String, u64> {
        self.counts
            .iter()
            .map(|(option, nodes)| {
                let total = nodes
                    .values()
                    .fold(0u64, |acc, value| acc.saturating_add(*value));
                (option.clone(), total)
            })
            .collect()
    }
}

/// The whole replicated database: every poll this node knows about.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ClusterCounterState {
    pub polls: BTreeMap<String, PollCounterState>,
}

impl ClusterCounterState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn merge(&mut self, other: &ClusterCounterState) -> bool {
        let mut changed = false;
        for (poll_id, state) in &other.polls {
            changed |= self.polls.entry(poll_id.clone()).or_default().merge(state);
        }
        changed
    }
}

fn raise(nodes: &mut BTreeMap<NodeId, u64>, node_id: &NodeId, value: u64) -> bool {
    match nodes.get_mut(node_id) {
        Some(current) if *current >= value => false,
        Some(current) => {
            *current = value;
            true
        }
        None => {
            nodes.insert(node_id.clone(), value);
            value > 0
        }
    }
}
