//! Concept tree - nested concepts with learner feedback
//!
//! Trees are plain `Vec<ConceptNode>` forests. Every traversal here is
//! pre-order: a node before its subtopics, siblings left to right.

pub mod node;

pub use node::{
    child_id, nodes_from_generated, normalize_answer, ConceptNode, DEFAULT_ANSWER, MAX_BATCH,
    NOT_UNDERSTOOD, PLACEHOLDER_OPTIONS,
};

/// First node with `id`, searching every branch
pub fn find<'a>(nodes: &'a [ConceptNode], id: &str) -> Option<&'a ConceptNode> {
    for node in nodes {
        if node.id == id {
            return Some(node);
        }
        if let Some(found) = find(&node.subtopics, id) {
            return Some(found);
        }
    }
    None
}

/// Mutable counterpart of [`find`]
pub fn find_mut<'a>(nodes: &'a mut [ConceptNode], id: &str) -> Option<&'a mut ConceptNode> {
    for node in nodes.iter_mut() {
        if node.id == id {
            return Some(node);
        }
        if let Some(found) = find_mut(&mut node.subtopics, id) {
            return Some(found);
        }
    }
    None
}

/// Follow child indexes from the roots down
pub fn node_at_mut<'a>(nodes: &'a mut [ConceptNode], path: &[usize]) -> Option<&'a mut ConceptNode> {
    let (first, rest) = path.split_first()?;
    let node = nodes.get_mut(*first)?;
    if rest.is_empty() {
        Some(node)
    } else {
        node_at_mut(&mut node.subtopics, rest)
    }
}

/// Visit every node with its immediate parent
pub fn walk<'a, F>(nodes: &'a [ConceptNode], visit: &mut F)
where
    F: FnMut(&'a ConceptNode, Option<&'a ConceptNode>),
{
    walk_under(nodes, None, visit);
}

fn walk_under<'a, F>(nodes: &'a [ConceptNode], parent: Option<&'a ConceptNode>, visit: &mut F)
where
    F: FnMut(&'a ConceptNode, Option<&'a ConceptNode>),
{
    for node in nodes {
        visit(node, parent);
        walk_under(&node.subtopics, Some(node), visit);
    }
}

/// Total number of nodes in the forest
pub fn count(nodes: &[ConceptNode]) -> usize {
    nodes.iter().map(|n| 1 + count(&n.subtopics)).sum()
}

/// Every node currently flagged "not understood", expanded or not
pub fn flagged(nodes: &[ConceptNode]) -> Vec<&ConceptNode> {
    let mut out = Vec::new();
    walk(nodes, &mut |node, _| {
        if node.is_not_understood() {
            out.push(node);
        }
    });
    out
}

/// Ordering used for review lists: shorter ids first, then by id text
pub fn review_order(a: &str, b: &str) -> std::cmp::Ordering {
    a.len().cmp(&b.len()).then_with(|| a.cmp(b))
}
