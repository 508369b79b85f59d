//! Tests for TreeClassifier: roles, flat-list order, dropped elements

use rstest::rstest;

use bubbletree::domain::{
    BubbleItem, DetachReason, DomainError, Forest, ForestOrder, Role, TreeClassifier, TreeElement,
    UnresolvedPolicy,
};
use bubbletree::util::testing;

fn ids<'a>(nodes: impl IntoIterator<Item = &'a bubbletree::domain::Node<BubbleItem>>) -> Vec<i64> {
    nodes.into_iter().map(|n| n.id()).collect()
}

fn classify(items: Vec<BubbleItem>) -> Forest<BubbleItem> {
    TreeClassifier::new().classify(items).expect("classify")
}

/// Five roots with internal nodes and one leaf per internal node.
fn demo_items() -> Vec<BubbleItem> {
    vec![
        BubbleItem::root(1, "1. Root Node First"),
        BubbleItem::root(2, "2. Root Node Second"),
        BubbleItem::root(3, "3. Root Node Third"),
        BubbleItem::child(6, 1, "1.1 Internal Node"),
        BubbleItem::child(7, 1, "1.2. Internal Node"),
        BubbleItem::child(9, 2, "2.1 Internal Node"),
        BubbleItem::child(14, 6, "1.1.1 Leaf Node"),
        BubbleItem::child(15, 7, "1.2.1 Leaf Node"),
        BubbleItem::child(17, 9, "2.1.1 Leaf Node"),
    ]
}

// ============================================================
// Basic Scenarios
// ============================================================

#[test]
fn given_empty_input_when_classifying_then_empty_forest() {
    let forest = classify(Vec::new());

    assert!(forest.is_empty());
    assert_eq!(forest.roots().count(), 0);
    assert!(forest.detached().is_empty());
}

#[test]
fn given_single_root_when_classifying_then_root_without_children() {
    // Arrange
    let items = vec![BubbleItem::root(1, "R")];

    // Act
    let forest = classify(items);

    // Assert
    assert_eq!(forest.len(), 1);
    let root = forest.roots().next().unwrap();
    assert_eq!(root.role, Role::Root);
    assert!(forest.children_of(root.index).is_empty());
    assert!(forest.descendants_of(root.index).is_empty());
}

#[test]
fn given_root_with_one_child_when_classifying_then_child_is_leaf() {
    let forest = classify(vec![BubbleItem::root(1, "R"), BubbleItem::child(2, 1, "C")]);

    let root = forest.find(1).unwrap();
    let children = forest.children_of(root.index);
    assert_eq!(ids(children.iter().copied()), vec![2]);
    assert_eq!(children[0].role, Role::Leaf);
    assert_eq!(children[0].parent, Some(root.index));
    assert_eq!(ids(forest.descendants_of(root.index)), vec![2]);
}

#[test]
fn given_chain_when_classifying_then_middle_is_internal() {
    let forest = classify(vec![
        BubbleItem::root(1, "R"),
        BubbleItem::child(2, 1, "A"),
        BubbleItem::child(3, 2, "B"),
    ]);

    let middle = forest.find(2).unwrap();
    assert_eq!(middle.role, Role::Internal);
    assert_eq!(forest.find(3).unwrap().role, Role::Leaf);
    assert_eq!(ids(forest.descendants_of(forest.find(1).unwrap().index)), vec![2, 3]);
}

#[test]
fn given_dangling_parent_when_classifying_then_element_dropped() {
    testing::init_test_setup();

    let forest = classify(vec![BubbleItem::root(1, "R"), BubbleItem::child(2, 99, "Orphan")]);

    assert_eq!(ids(forest.iter()), vec![1]);
    assert_eq!(forest.detached().len(), 1);
    assert_eq!(forest.detached()[0].id, 2);
    assert_eq!(forest.detached()[0].parent_id, 99);
    assert_eq!(forest.detached()[0].reason, DetachReason::MissingParent);
}

/// Duplicate ids are not deduplicated: both elements become roots.
#[test]
fn given_duplicate_root_ids_when_classifying_then_both_become_roots() {
    let forest = classify(vec![BubbleItem::root(1, "R"), BubbleItem::root(1, "Dup")]);

    let labels: Vec<&str> = forest.roots().map(|n| n.label()).collect();
    assert_eq!(labels, vec!["R", "Dup"]);
}

#[test]
fn given_duplicate_parent_ids_when_classifying_then_children_attach_to_first() {
    let forest = classify(vec![
        BubbleItem::root(1, "First"),
        BubbleItem::root(1, "Second"),
        BubbleItem::child(2, 1, "Child"),
    ]);

    let roots: Vec<_> = forest.roots().collect();
    assert_eq!(forest.children_of(roots[0].index).len(), 1);
    assert!(forest.children_of(roots[1].index).is_empty());
}

/// A parent id binds to the duplicate that is actually built, not to an
/// earlier one that never reaches a root.
#[test]
fn given_unreachable_duplicate_before_root_when_classifying_then_child_attaches_to_root() {
    // Arrange
    let items = vec![
        BubbleItem::child(1, 99, "Ghost"),
        BubbleItem::root(1, "R"),
        BubbleItem::child(2, 1, "C"),
    ];

    // Act
    let forest = classify(items);

    // Assert
    assert_eq!(ids(forest.iter()), vec![1, 2]);
    let root = forest.roots().next().unwrap();
    assert_eq!(root.label(), "R");
    assert_eq!(ids(forest.children_of(root.index)), vec![2]);
    let detached: Vec<(i64, DetachReason)> = forest.detached().iter().map(|d| (d.id, d.reason)).collect();
    assert_eq!(detached, vec![(1, DetachReason::MissingParent)]);
}

#[test]
fn given_duplicate_reachable_only_later_when_classifying_then_first_built_claims_children() {
    let forest = classify(vec![
        BubbleItem::child(5, 2, "Deep dup"),
        BubbleItem::root(2, "R"),
        BubbleItem::root(5, "Top dup"),
        BubbleItem::child(6, 5, "C"),
    ]);

    // Root 2 is built first and pulls in "Deep dup" (id 5), which then claims C
    let deep = forest.iter().find(|n| n.label() == "Deep dup").unwrap();
    let top = forest.iter().find(|n| n.label() == "Top dup").unwrap();
    assert_eq!(ids(forest.children_of(deep.index)), vec![6]);
    assert!(forest.children_of(top.index).is_empty());
    assert_eq!(forest.len(), 4);
}

// ============================================================
// Flat List Order
// ============================================================

#[test]
fn given_demo_items_when_classifying_then_flat_list_is_root_then_post_order_branches() {
    let forest = classify(demo_items());

    assert_eq!(ids(forest.iter()), vec![1, 14, 6, 15, 7, 2, 17, 9, 3]);
}

#[test]
fn given_children_listed_before_parent_when_classifying_then_children_keep_source_order() {
    let forest = classify(vec![
        BubbleItem::child(3, 1, "c"),
        BubbleItem::child(2, 1, "b"),
        BubbleItem::root(1, "R"),
    ]);

    let root = forest.find(1).unwrap();
    assert_eq!(ids(forest.children_of(root.index)), vec![3, 2]);
}

#[rstest]
#[case(ForestOrder::Construction, vec![1, 14, 6, 15, 7, 2, 17, 9, 3])]
#[case(ForestOrder::Id, vec![1, 2, 3, 6, 7, 9, 14, 15, 17])]
#[case(ForestOrder::IdDesc, vec![17, 15, 14, 9, 7, 6, 3, 2, 1])]
#[case(ForestOrder::Label, vec![1, 6, 14, 7, 15, 2, 9, 17, 3])]
#[case(ForestOrder::LabelDesc, vec![3, 17, 9, 2, 15, 7, 14, 6, 1])]
fn given_order_when_classifying_then_flat_list_sorted(#[case] order: ForestOrder, #[case] expected: Vec<i64>) {
    let forest = TreeClassifier::new().with_order(order).classify(demo_items()).unwrap();

    assert_eq!(ids(forest.iter()), expected);
}

#[test]
fn given_sort_order_when_classifying_then_child_lists_untouched() {
    let forest = TreeClassifier::new()
        .with_order(ForestOrder::IdDesc)
        .classify(demo_items())
        .unwrap();

    let root = forest.find(1).unwrap();
    assert_eq!(ids(forest.children_of(root.index)), vec![6, 7]);
    assert_eq!(ids(forest.roots()), vec![1, 2, 3]);
}

#[test]
fn given_equal_keys_when_classifying_by_then_sort_is_stable() {
    let forest = TreeClassifier::new()
        .classify_by(
            vec![
                BubbleItem::root(1, "same"),
                BubbleItem::root(2, "same"),
                BubbleItem::root(3, "a"),
            ],
            |n| n.label().to_owned(),
            false,
        )
        .unwrap();

    assert_eq!(ids(forest.iter()), vec![3, 1, 2]);
}

#[test]
fn given_descending_key_when_classifying_by_then_reversed_by_key() {
    let forest = TreeClassifier::new()
        .classify_by(demo_items(), |n| n.label().len(), true)
        .unwrap();

    let lengths: Vec<usize> = forest.iter().map(|n| n.label().len()).collect();
    assert!(lengths.windows(2).all(|w| w[0] >= w[1]));
}

// ============================================================
// Unresolved Policy
// ============================================================

#[rstest]
#[case(UnresolvedPolicy::Ignore)]
#[case(UnresolvedPolicy::Warn)]
fn given_lenient_policy_when_subtree_detached_then_whole_subtree_dropped(#[case] policy: UnresolvedPolicy) {
    let forest = TreeClassifier::new()
        .with_policy(policy)
        .classify(vec![
            BubbleItem::root(1, "R"),
            BubbleItem::child(2, 99, "Orphan"),
            BubbleItem::child(3, 2, "Orphan child"),
        ])
        .unwrap();

    assert_eq!(ids(forest.iter()), vec![1]);
    let reasons: Vec<(i64, DetachReason)> = forest.detached().iter().map(|d| (d.id, d.reason)).collect();
    assert_eq!(
        reasons,
        vec![(2, DetachReason::MissingParent), (3, DetachReason::DetachedAncestor)]
    );
}

#[test]
fn given_reject_policy_when_parent_missing_then_error_names_root_cause() {
    let result = TreeClassifier::new()
        .with_policy(UnresolvedPolicy::Reject)
        .classify(vec![
            BubbleItem::root(1, "R"),
            BubbleItem::child(3, 2, "Below orphan"),
            BubbleItem::child(2, 99, "Orphan"),
        ]);

    assert_eq!(
        result.unwrap_err(),
        DomainError::UnresolvedParent { id: 2, parent_id: 99 }
    );
}

#[test]
fn given_reject_policy_when_all_resolve_then_ok() {
    let forest = TreeClassifier::new()
        .with_policy(UnresolvedPolicy::Reject)
        .classify(demo_items())
        .unwrap();

    assert_eq!(forest.len(), 9);
}

#[test]
fn given_two_element_cycle_when_classifying_then_reported_as_cycle() {
    let forest = classify(vec![
        BubbleItem::root(1, "R"),
        BubbleItem::child(2, 3, "A"),
        BubbleItem::child(3, 2, "B"),
    ]);

    assert_eq!(forest.len(), 1);
    assert!(forest.detached().iter().all(|d| d.reason == DetachReason::Cycle));
    assert_eq!(forest.detached().len(), 2);
}

#[test]
fn given_reject_policy_when_cycle_then_cycle_error() {
    let result = TreeClassifier::new()
        .with_policy(UnresolvedPolicy::Reject)
        .classify(vec![BubbleItem::child(5, 5, "Self")]);

    assert_eq!(result.unwrap_err(), DomainError::CycleDetected(5));
}

// ============================================================
// Structural Properties
// ============================================================

#[test]
fn given_forest_when_checking_roles_then_leaf_iff_no_children() {
    let forest = classify(demo_items());

    for node in forest.iter() {
        match node.role {
            Role::Root => assert!(node.parent.is_none()),
            Role::Internal => assert!(!node.children.is_empty() && node.parent.is_some()),
            Role::Leaf => assert!(node.children.is_empty() && node.parent.is_some()),
        }
    }
}

#[test]
fn given_forest_when_listing_roots_then_exactly_parentless_elements() {
    let items = demo_items();
    let expected: Vec<i64> = items
        .iter()
        .filter(|i| i.parent_id().is_none())
        .map(|i| i.element_id())
        .collect();

    let forest = classify(items);

    assert_eq!(ids(forest.roots()), expected);
}

#[test]
fn given_forest_when_comparing_queries_then_descendants_flatten_children_preorder() {
    fn flatten(forest: &Forest<BubbleItem>, idx: bubbletree::domain::Index, out: &mut Vec<i64>) {
        for child in forest.children_of(idx) {
            out.push(child.id());
            flatten(forest, child.index, out);
        }
    }

    let forest = classify(demo_items());

    for node in forest.iter() {
        let mut expected = Vec::new();
        flatten(&forest, node.index, &mut expected);
        assert_eq!(ids(forest.descendants_of(node.index)), expected);
    }
}

#[test]
fn given_same_input_when_classifying_twice_then_same_structure() {
    let first = classify(demo_items());
    let second = classify(demo_items());

    assert_eq!(ids(first.iter()), ids(second.iter()));
    let roles = |f: &Forest<BubbleItem>| f.iter().map(|n| n.role).collect::<Vec<_>>();
    assert_eq!(roles(&first), roles(&second));
}
