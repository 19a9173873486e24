use crate::ancestry::{NodeIndex, ancestor_ids};
use crate::snapshot::Node;

/// Subset of node ids the router must treat as potential obstacles for an
/// edge between `source` and `target`. Only nodes sharing the endpoints'
/// nesting context matter; unrelated branches of the forest are skipped so
/// the obstacle search stays small.
///
/// The ancestor chains start at each endpoint's parent and are truncated at
/// (and including) the lowest common ancestor when one exists.
pub fn relevant_obstacles<'n>(
    index: &NodeIndex<'_>,
    nodes: impl Iterator<Item = &'n Node>,
    source: &Node,
    target: &Node,
    lca: Option<&Node>,
) -> Vec<String> {
    let source_ancestors = ancestor_ids(index, index.parent_of(source), lca);
    let target_ancestors = ancestor_ids(index, index.parent_of(target), lca);

    nodes
        .filter(|node| {
            if node.id == source.id || node.id == target.id {
                return true;
            }
            // A border node's container occludes its own perimeter, so the
            // container routes as an obstacle unless it already sits on the
            // other endpoint's chain. Asymmetric on purpose.
            if source.border_node && Some(node.id.as_str()) == source.parent.as_deref() {
                return !target_ancestors.contains(&node.id);
            }
            if target.border_node && Some(node.id.as_str()) == target.parent.as_deref() {
                return !source_ancestors.contains(&node.id);
            }
            let sibling_of_source_ancestor = node
                .parent
                .as_ref()
                .is_some_and(|parent| source_ancestors.contains(parent));
            let sibling_of_target_ancestor = node
                .parent
                .as_ref()
                .is_some_and(|parent| target_ancestors.contains(parent));
            // Without a common ancestor the endpoints sit at the root level,
            // where every other root-level node shares their containment.
            let child_of_lca = match lca {
                Some(lca) => node.parent.as_deref() == Some(lca.id.as_str()),
                None => node.parent.is_none(),
            };
            let direct_ancestor =
                source_ancestors.contains(&node.id) || target_ancestors.contains(&node.id);
            (sibling_of_source_ancestor || sibling_of_target_ancestor || child_of_lca)
                && !direct_ancestor
        })
        .map(|node| node.id.clone())
        .collect()
}
