//! Property-based tests for resource-key canonicalization.
//!
//! Uses proptest to verify:
//! 1. Parameter insertion order never changes a key's identity.
//! 2. Filter-derived keys equal keys built manually from the same params.
//! 3. Two filters map to the same key exactly when they are equal.

use proptest::prelude::*;

use taskflow::cache::{ResourceKey, ResourceKind};
use taskflow_proto::filter::TaskFilter;
use taskflow_proto::task::{TaskPriority, TaskStatus};
use taskflow_proto::team::TeamId;

// --- Strategies ---

/// Strategy for an optional status filter.
fn arb_status() -> impl Strategy<Value = Option<TaskStatus>> {
    prop_oneof![
        Just(None),
        Just(Some(TaskStatus::Todo)),
        Just(Some(TaskStatus::Progress)),
        Just(Some(TaskStatus::Review)),
        Just(Some(TaskStatus::Done)),
    ]
}

/// Strategy for an optional priority filter.
fn arb_priority() -> impl Strategy<Value = Option<TaskPriority>> {
    prop_oneof![
        Just(None),
        Just(Some(TaskPriority::Low)),
        Just(Some(TaskPriority::Medium)),
        Just(Some(TaskPriority::High)),
        Just(Some(TaskPriority::Urgent)),
    ]
}

/// Strategy for parameter sets with unique names, as a `Vec` so order can
/// be permuted.
fn arb_params() -> impl Strategy<Value = Vec<(String, String)>> {
    prop::collection::btree_map("[a-z]{1,8}", "[a-z0-9]{0,12}", 0..6)
        .prop_map(|map| map.into_iter().collect())
}

// --- Property tests ---

proptest! {
    /// Reordering the parameter pairs never produces a different key.
    #[test]
    fn param_order_is_irrelevant(params in arb_params()) {
        let forward = ResourceKey::from_params(ResourceKind::TaskList, params.clone());

        let mut reversed = params.clone();
        reversed.reverse();
        prop_assert_eq!(
            &forward,
            &ResourceKey::from_params(ResourceKind::TaskList, reversed)
        );

        let mut rotated = params;
        if !rotated.is_empty() {
            rotated.rotate_left(1);
        }
        prop_assert_eq!(
            &forward,
            &ResourceKey::from_params(ResourceKind::TaskList, rotated)
        );
    }

    /// A filter-derived key equals the key built manually from the same
    /// parameters, regardless of the order they are supplied in.
    #[test]
    fn filter_keys_are_canonical(status in arb_status(), priority in arb_priority()) {
        let filter = TaskFilter { status, priority };
        let from_filter = ResourceKey::task_list(&filter);

        let mut params = filter.params();
        params.reverse();
        let manual = ResourceKey::from_params(ResourceKind::TaskList, params);
        prop_assert_eq!(from_filter, manual);
    }

    /// Key identity tracks filter identity: equal filters collide on one
    /// entry, different filters never do.
    #[test]
    fn distinct_filters_get_distinct_keys(
        a_status in arb_status(),
        a_priority in arb_priority(),
        b_status in arb_status(),
        b_priority in arb_priority(),
    ) {
        let a = ResourceKey::task_list(&TaskFilter { status: a_status, priority: a_priority });
        let b = ResourceKey::task_list(&TaskFilter { status: b_status, priority: b_priority });
        prop_assert_eq!(a == b, a_status == b_status && a_priority == b_priority);
    }

    /// The canonical display form is identical for equal keys built in
    /// different orders.
    #[test]
    fn display_ignores_insertion_order(params in arb_params()) {
        let forward = ResourceKey::from_params(ResourceKind::TaskList, params.clone());
        let mut reversed = params;
        reversed.reverse();
        let backward = ResourceKey::from_params(ResourceKind::TaskList, reversed);
        prop_assert_eq!(forward.to_string(), backward.to_string());
    }

    /// Invite-info keys round-trip their team id.
    #[test]
    fn invite_keys_carry_their_team(raw in 1i64..1_000_000) {
        let key = ResourceKey::invite_info(TeamId::new(raw));
        prop_assert_eq!(key.team(), Some(TeamId::new(raw)));
        prop_assert_eq!(key.kind(), ResourceKind::InviteInfo);
    }
}
