use std::collections::{HashMap, HashSet};

use indexmap::IndexMap;

use crate::model::task::{TaskNode, TaskRecord};

/// Build the display tree from a flat snapshot of records.
///
/// Records are indexed by id. Provider ids are unique; if a duplicate ever
/// arrives, the last record wins and keeps the first one's place in input
/// order. A record whose parent id is absent from the snapshot is promoted
/// to a root rather than dropped. Children are sorted by `position` under
/// byte order, absent position sorting first; the sort is stable, so equal
/// positions keep their input order across refreshes.
///
/// Parent links are classified in a single pass, so a cyclic parent chain
/// among non-root records is unreachable from any root and is left out of
/// the result. Each child bucket is consumed at most once, which also means
/// a malformed chain can never recurse forever.
pub fn build_tree(records: Vec<TaskRecord>) -> Vec<TaskNode> {
    let mut index: IndexMap<String, TaskRecord> = IndexMap::with_capacity(records.len());
    for record in records {
        index.insert(record.id.clone(), record);
    }

    let known: HashSet<String> = index.keys().cloned().collect();
    let mut buckets: HashMap<String, Vec<TaskRecord>> = HashMap::new();
    let mut top = Vec::new();
    for (_, record) in index {
        match &record.parent {
            Some(parent) if known.contains(parent) => {
                buckets.entry(parent.clone()).or_default().push(record);
            }
            _ => top.push(record),
        }
    }

    let mut roots: Vec<TaskNode> = top
        .into_iter()
        .map(|record| attach(record, &mut buckets))
        .collect();
    roots.sort_by(|a, b| a.position.cmp(&b.position));
    roots
}

fn attach(record: TaskRecord, buckets: &mut HashMap<String, Vec<TaskRecord>>) -> TaskNode {
    let mut node = TaskNode::from_record(record);
    if let Some(kids) = buckets.remove(&node.id) {
        node.children = kids
            .into_iter()
            .map(|record| attach(record, buckets))
            .collect();
        node.children.sort_by(|a, b| a.position.cmp(&b.position));
    }
    node
}

/// Total node count across the tree.
pub fn count_nodes(roots: &[TaskNode]) -> usize {
    roots
        .iter()
        .map(|node| 1 + count_nodes(&node.children))
        .sum()
}
