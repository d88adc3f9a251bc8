//! Counter Store Tests
//!
//! ## Test Scopes
//! - **Increment**: Local component growth and immediate visibility in aggregates.
//! - **Merge**: Max semantics, idempotence, stale updates, implicit creation.
//! - **Snapshots**: Exports are isolated copies.
//! - **Lattice laws**: Property tests for commutativity, associativity, identity and idempotence.
//! - **Concurrency**: Parallel increments on one (poll, option) are not lost.

#[cfg(test)]
mod tests {
    use crate::counter::store::CounterStore;
    use crate::counter::types::{ClusterCounterState, CounterUpdate, NodeId, PollCounterState};
    use proptest::prelude::*;
    use std::collections::BTreeMap;
    use std::sync::Arc;

    fn update(poll_id: &str, option: &str, node: &str, value: u64) -> CounterUpdate {
        CounterUpdate {
            poll_id: poll_id.to_string(),
            option: option.to_string(),
            node_id: NodeId::from(node),
            value,
        }
    }

    // ============================================================
    // INCREMENT
    // ============================================================

    #[test]
    fn test_increment_n_times() {
        let store = CounterStore::new(NodeId::from("node1"));

        for i in 1..=5u64 {
            let update = store.increment("p1", "yes");
            assert_eq!(update.value, i);
            assert_eq!(update.node_id, NodeId::from("node1"));
            assert_eq!(store.query_aggregate("p1")["yes"], i);
        }

        let state = store.export_poll_state("p1");
        assert_eq!(state.component("yes", &NodeId::from("node1")), 5);
    }

    #[test]
    fn test_increment_saturates() {
        let store = CounterStore::new(NodeId::from("node1"));
        store.merge_component(&update("p1", "yes", "node1", u64::MAX));

        let bumped = store.increment("p1", "yes");
        assert_eq!(bumped.value, u64::MAX);

        store.merge_component(&update("p1", "yes", "node2", 10));
        assert_eq!(store.query_aggregate("p1")["yes"], u64::MAX);
    }

    #[test]
    fn test_aggregate_sums_node_components() {
        let store = CounterStore::new(NodeId::from("node1"));
        store.increment("p1", "yes");
        store.increment("p1", "no");
        store.merge_component(&update("p1", "yes", "node2", 4));
        store.merge_component(&update("p1", "yes", "node3", 2));

        let counts = store.query_aggregate("p1");
        assert_eq!(counts.len(), 2);
        assert_eq!(counts["yes"], 7);
        assert_eq!(counts["no"], 1);
    }

    #[test]
    fn test_unknown_poll_reads_empty_without_creating_it() {
        let store = CounterStore::new(NodeId::from("node1"));

        assert!(store.query_aggregate("missing").is_empty());
        assert_eq!(store.export_poll_state("missing"), PollCounterState::default());
        assert_eq!(store.poll_count(), 0);
    }

    // ============================================================
    // MERGE
    // ============================================================

    #[test]
    fn test_merge_component_takes_max() {
        let store = CounterStore::new(NodeId::from("node1"));

        assert!(store.merge_component(&update("p1", "yes", "node2", 3)));
        assert!(!store.merge_component(&update("p1", "yes", "node2", 3)));
        assert!(!store.merge_component(&update("p1", "yes", "node2", 1)));
        assert!(store.merge_component(&update("p1", "yes", "node2", 5)));

        assert_eq!(store.query_aggregate("p1")["yes"], 5);
    }

    #[test]
    fn test_merge_zero_creates_option_without_change() {
        let store = CounterStore::new(NodeId::from("node1"));

        assert!(!store.merge_component(&update("p1", "maybe", "node2", 0)));
        assert_eq!(store.query_aggregate("p1")["maybe"], 0);
    }

    #[test]
    fn test_merge_poll_state_creates_missing_entries() {
        let store = CounterStore::new(NodeId::from("node1"));
        store.increment("p1", "yes");

        let mut other = PollCounterState::new();
        other.merge_component("yes", &NodeId::from("node2"), 2);
        other.merge_component("no", &NodeId::from("node2"), 1);

        assert!(store.merge_poll_state("p1", &other));
        assert!(!store.merge_poll_state("p1", &other));

        let counts = store.query_aggregate("p1");
        assert_eq!(counts["yes"], 3);
        assert_eq!(counts["no"], 1);
    }

    #[test]
    fn test_merge_never_lowers_own_component() {
        let store = CounterStore::new(NodeId::from("node1"));
        for _ in 0..4 {
            store.increment("p1", "yes");
        }

        let mut stale = ClusterCounterState::new();
        stale
            .polls
            .entry("p1".to_string())
            .or_default()
            .merge_component("yes", &NodeId::from("node1"), 2);

        assert!(!store.merge_cluster_state(&stale));
        assert_eq!(store.increment("p1", "yes").value, 5);
    }

    // ============================================================
    // SNAPSHOTS
    // ============================================================

    #[test]
    fn test_exported_state_is_isolated() {
        let store = CounterStore::new(NodeId::from("node1"));
        store.increment("p1", "yes");

        let mut exported = store.export_poll_state("p1");
        exported.merge_component("yes", &NodeId::from("node1"), 100);
        exported.counts.remove("yes");

        let mut cluster = store.export_cluster_state();
        cluster.polls.clear();

        assert_eq!(store.query_aggregate("p1")["yes"], 1);
    }

    #[test]
    fn test_state_wire_format() {
        let store = CounterStore::new(NodeId::from("node1"));
        store.increment("p1", "yes");
        store.increment("p1", "yes");

        let poll = serde_json::to_value(store.export_poll_state("p1")).unwrap();
        assert_eq!(poll, serde_json::json!({"counts": {"yes": {"node1": 2}}}));

        let cluster = serde_json::to_value(store.export_cluster_state()).unwrap();
        assert_eq!(
            cluster,
            serde_json::json!({"polls": {"p1": {"counts": {"yes": {"node1": 2}}}}})
        );
    }

    #[test]
    fn test_negative_count_is_rejected_on_decode() {
        let result = serde_json::from_value::<CounterUpdate>(serde_json::json!({
            "poll_id": "p1",
            "option": "yes",
            "node_id": "node2",
            "value": -3
        }));
        assert!(result.is_err());

        let result = serde_json::from_value::<PollCounterState>(
            serde_json::json!({"counts": {"yes": {"node2": -1}}}),
        );
        assert!(result.is_err());
    }

    // ============================================================
    // LATTICE LAWS
    // ============================================================

    fn poll_state() -> impl Strategy<Value = PollCounterState> {
        prop::collection::btree_map(
            prop::sample::select(vec!["yes", "no", "maybe"]),
            prop::collection::btree_map(
                prop::sample::select(vec!["n1", "n2", "n3", "n4"]),
                0u64..50,
                0..4,
            ),
            0..3,
        )
        .prop_map(|raw| PollCounterState {
            counts: raw
                .into_iter()
                .map(|(option, nodes)| {
                    let nodes: BTreeMap<NodeId, u64> = nodes
                        .into_iter()
                        .map(|(node, value)| (NodeId::from(node), value))
                        .collect();
                    (option.to_string(), nodes)
                })
                .collect(),
        })
    }

    fn cluster_state() -> impl Strategy<Value = ClusterCounterState> {
        prop::collection::btree_map(prop::sample::select(vec!["p1", "p2"]), poll_state(), 0..3)
            .prop_map(|raw| ClusterCounterState {
                polls: raw
                    .into_iter()
                    .map(|(poll_id, state)| (poll_id.to_string(), state))
                    .collect(),
            })
    }

    fn joined(a: &ClusterCounterState, b: &ClusterCounterState) -> ClusterCounterState {
        let mut out = a.clone();
        out.merge(b);
        out
    }

    proptest! {
        #[test]
        fn prop_merge_is_commutative(a in cluster_state(), b in cluster_state()) {
            prop_assert_eq!(joined(&a, &b), joined(&b, &a));
        }

        #[test]
        fn prop_merge_is_associative(
            a in cluster_state(),
            b in cluster_state(),
            c in cluster_state(),
        ) {
            prop_assert_eq!(joined(&joined(&a, &b), &c), joined(&a, &joined(&b, &c)));
        }

        #[test]
        fn prop_empty_state_is_identity(a in cluster_state()) {
            prop_assert_eq!(joined(&a, &ClusterCounterState::new()), a.clone());
            prop_assert_eq!(joined(&ClusterCounterState::new(), &a), a);
        }

        #[test]
        fn prop_merge_is_idempotent(a in cluster_state(), b in cluster_state()) {
            let mut once = a.clone();
            once.merge(&b);
            let mut twice = once.clone();
            prop_assert!(!twice.merge(&b));
            prop_assert_eq!(once, twice);
        }

        #[test]
        fn prop_merge_is_pointwise_max(a in poll_state(), b in poll_state()) {
            let mut merged = a.clone();
            merged.merge(&b);
            for state in [&a, &b] {
                for (option, nodes) in &state.counts {
                    for node in nodes.keys() {
                        let expected = a.component(option, node).max(b.component(option, node));
                        prop_assert_eq!(merged.component(option, node), expected);
                    }
                }
            }
        }

        #[test]
        fn prop_aggregate_never_decreases(a in poll_state(), b in poll_state()) {
            let before = a.totals();
            let mut merged = a.clone();
            merged.merge(&b);
            let after = merged.totals();
            for (option, total) in before {
                prop_assert!(after[&option] >= total);
            }
        }
    }

    // ============================================================
    // CONCURRENCY
    // ============================================================

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_increments_are_not_lost() {
        let store = Arc::new(CounterStore::new(NodeId::from("node1")));

        let mut handles = Vec::new();
        for _ in 0..8 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                for _ in 0..250 {
                    store.increment("p1", "yes");
                }
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        assert_eq!(store.query_aggregate("p1")["yes"], 2000);
    }
}
