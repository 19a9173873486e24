use std::collections::{BTreeMap, HashMap, HashSet};

use crate::snapshot::Node;

/// Borrowed id-to-node lookup built once per resolving pass. Parent walks go
/// through this table instead of a self-referential graph, so deep nesting
/// costs a loop iteration rather than a stack frame.
pub struct NodeIndex<'a> {
    by_id: HashMap<&'a str, &'a Node>,
}

impl<'a> NodeIndex<'a> {
    pub fn new(nodes: &'a BTreeMap<String, Node>) -> Self {
        let by_id = nodes.values().map(|node| (node.id.as_str(), node)).collect();
        Self { by_id }
    }

    pub fn get(&self, id: &str) -> Option<&'a Node> {
        self.by_id.get(id).copied()
    }

    pub fn parent_of(&self, node: &Node) -> Option<&'a Node> {
        node.parent.as_deref().and_then(|id| self.get(id))
    }
}

/// Ordered chain `[start, parent(start), ...]` walking parent links to a
/// root, or stopping at (and including) `stop` when given. Requires an
/// acyclic parent relation; the snapshot loader guarantees it.
pub fn ancestor_chain<'a>(
    index: &NodeIndex<'a>,
    start: Option<&'a Node>,
    stop: Option<&Node>,
) -> Vec<&'a Node> {
    let mut chain = Vec::new();
    let mut cursor = start;
    while let Some(node) = cursor {
        chain.push(node);
        if let Some(stop) = stop
            && node.id == stop.id
        {
            break;
        }
        cursor = index.parent_of(node);
    }
    chain
}

pub fn ancestor_ids(index: &NodeIndex<'_>, start: Option<&Node>, stop: Option<&Node>) -> Vec<String> {
    ancestor_chain(index, start, stop)
        .into_iter()
        .map(|node| node.id.clone())
        .collect()
}

/// Nearest shared container of two nodes, or `None` when they live in
/// unrelated branches of the forest. The chain of the source (including the
/// source itself) is collected as a set, then the target's chain is walked
/// upward until the first member found.
pub fn lowest_common_ancestor<'a>(
    index: &NodeIndex<'a>,
    source: &'a Node,
    target: &'a Node,
) -> Option<&'a Node> {
    let source_ids: HashSet<&str> = ancestor_chain(index, Some(source), None)
        .into_iter()
        .map(|node| node.id.as_str())
        .collect();
    let mut cursor = Some(target);
    while let Some(node) = cursor {
        if source_ids.contains(node.id.as_str()) {
            return Some(node);
        }
        cursor = index.parent_of(node);
    }
    None
}

pub fn is_ancestor_of(index: &NodeIndex<'_>, child: &Node, candidate: &Node) -> bool {
    let mut cursor = index.parent_of(child);
    while let Some(node) = cursor {
        if node.id == candidate.id {
            return true;
        }
        cursor = index.parent_of(node);
    }
    false
}
