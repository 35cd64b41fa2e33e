//! Properties of the flat-records → ordered-tree transformation.

use pretty_assertions::assert_eq;
use sprig::model::task::{TaskNode, TaskRecord, TaskStatus, UNTITLED};
use sprig::model::tree::{build_tree, count_nodes};

fn record(id: &str, parent: Option<&str>, position: &str) -> TaskRecord {
    TaskRecord {
        parent: parent.map(String::from),
        position: Some(position.to_string()),
        ..TaskRecord::new(id)
    }
}

/// Collect every id in the tree, depth-first.
fn collect_ids(roots: &[TaskNode], out: &mut Vec<String>) {
    for node in roots {
        out.push(node.id.clone());
        collect_ids(&node.children, out);
    }
}

/// Assert every node's children are non-decreasing by position.
fn assert_sorted(roots: &[TaskNode]) {
    for node in roots {
        for pair in node.children.windows(2) {
            assert!(
                pair[0].position <= pair[1].position,
                "children of {} out of order: {:?} > {:?}",
                node.id,
                pair[0].position,
                pair[1].position
            );
        }
        assert_sorted(&node.children);
    }
}

// ---------------------------------------------------------------------------
// Scenarios
// ---------------------------------------------------------------------------

#[test]
fn one_root_with_children_ordered_by_position() {
    // records [{1, root, "a"}, {2, parent 1, "b"}, {3, parent 1, "a"}]
    // → one root (1) with children ordered [3, 2]
    let roots = build_tree(vec![
        record("1", None, "a"),
        record("2", Some("1"), "b"),
        record("3", Some("1"), "a"),
    ]);

    assert_eq!(roots.len(), 1);
    assert_eq!(roots[0].id, "1");
    let ids: Vec<&str> = roots[0].children.iter().map(|n| n.id.as_str()).collect();
    assert_eq!(ids, ["3", "2"]);
}

#[test]
fn missing_parent_promotes_to_root() {
    // a record whose parent is not in the snapshot becomes a root,
    // never dropped
    let roots = build_tree(vec![record("1", Some("missing"), "a")]);

    assert_eq!(roots.len(), 1);
    assert_eq!(roots[0].id, "1");
    assert!(roots[0].children.is_empty());
}

// ---------------------------------------------------------------------------
// Properties
// ---------------------------------------------------------------------------

#[test]
fn no_record_is_lost_or_duplicated() {
    let roots = build_tree(vec![
        record("e", Some("b"), "2"),
        record("a", None, "9"),
        record("b", None, "1"),
        record("c", Some("a"), "5"),
        record("d", Some("ghost"), "3"),
        record("f", Some("c"), "0"),
    ]);

    let mut ids = Vec::new();
    collect_ids(&roots, &mut ids);
    ids.sort();
    assert_eq!(ids, ["a", "b", "c", "d", "e", "f"]);
    assert_eq!(count_nodes(&roots), 6);
}

#[test]
fn all_sibling_lists_are_sorted() {
    let roots = build_tree(vec![
        record("r2", None, "b"),
        record("r1", None, "a"),
        record("c3", Some("r1"), "c"),
        record("c1", Some("r1"), "a"),
        record("c2", Some("r1"), "b"),
        record("g2", Some("c1"), "z"),
        record("g1", Some("c1"), "y"),
    ]);
    assert_sorted(&roots);
    let root_ids: Vec<&str> = roots.iter().map(|n| n.id.as_str()).collect();
    assert_eq!(root_ids, ["r1", "r2"]);
}

#[test]
fn ties_preserve_input_order() {
    let roots = build_tree(vec![
        record("first", None, "same"),
        record("second", None, "same"),
        record("third", None, "same"),
    ]);
    let ids: Vec<&str> = roots.iter().map(|n| n.id.as_str()).collect();
    assert_eq!(ids, ["first", "second", "third"]);
}

#[test]
fn build_is_idempotent_across_distinct_inputs() {
    let make = || {
        vec![
            record("a", None, "1"),
            record("b", Some("a"), "2"),
            record("c", Some("a"), "1"),
            record("d", Some("missing"), "0"),
        ]
    };
    // two calls over equal-but-distinct inputs yield structurally equal trees
    assert_eq!(build_tree(make()), build_tree(make()));
}

#[test]
fn normalization_fills_defaults() {
    let sparse = TaskRecord::new("bare");
    let roots = build_tree(vec![sparse]);
    let node = &roots[0];
    assert_eq!(node.title, UNTITLED);
    assert_eq!(node.status, TaskStatus::NeedsAction);
    assert_eq!(node.notes, "");
    assert_eq!(node.position, "");
}

// ---------------------------------------------------------------------------
// Edge cases
// ---------------------------------------------------------------------------

#[test]
fn cycle_of_children_is_unreachable() {
    // Two records that point at each other are classified as children in
    // the single pass, so neither is reachable from any root. This pins
    // the documented behavior: silently unreachable, never a crash.
    let roots = build_tree(vec![
        record("solo", None, "a"),
        record("x", Some("y"), "a"),
        record("y", Some("x"), "b"),
    ]);

    let mut ids = Vec::new();
    collect_ids(&roots, &mut ids);
    assert_eq!(ids, ["solo"]);
}

#[test]
fn self_parent_is_unreachable() {
    let roots = build_tree(vec![
        record("solo", None, "a"),
        record("loop", Some("loop"), "b"),
    ]);

    let mut ids = Vec::new();
    collect_ids(&roots, &mut ids);
    assert_eq!(ids, ["solo"]);
}

#[test]
fn deep_chains_attach_fully() {
    let mut records = vec![record("n0", None, "p")];
    for i in 1..50 {
        records.push(record(
            &format!("n{i}"),
            Some(&format!("n{}", i - 1)),
            "p",
        ));
    }
    let roots = build_tree(records);
    assert_eq!(count_nodes(&roots), 50);

    let mut depth = 0;
    let mut node = &roots[0];
    while let Some(child) = node.children.first() {
        node = child;
        depth += 1;
    }
    assert_eq!(depth, 49);
}
