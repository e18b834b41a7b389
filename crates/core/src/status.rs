//! Node status resolution.
//!
//! [`resolve`] is a pure function of the graph and the completion history:
//! no hidden state, safe to call on every render and from any thread. Node ids
//! and completed ids are both canonicalized through the alias table before
//! any membership test.

use std::collections::HashSet;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::aliases::{canonical_lesson_ids, lesson_id_for};
use crate::curriculum::Node;
use crate::error::CoreError;

/// Display state of a node. `Completed` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeStatus {
    Locked,
    Current,
    Completed,
}

/// A node together with its resolved status.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeView {
    #[serde(flatten)]
    pub node: Node,
    pub status: NodeStatus,
}

/// Resolve the status of every node, keyed by node id in authoring order.
pub fn resolve<'a, I>(nodes: &[Node], completed_lesson_ids: I) -> IndexMap<String, NodeStatus>
where
    I: IntoIterator<Item = &'a str>,
{
    let completed = canonical_lesson_ids(completed_lesson_ids);
    nodes
        .iter()
        .enumerate()
        .map(|(i, node)| (node.id.clone(), status_of(nodes, i, &completed)))
        .collect()
}

fn status_of(nodes: &[Node], i: usize, completed: &HashSet<String>) -> NodeStatus {
    let done = |id: &str| completed.contains(lesson_id_for(id));
    let node = &nodes[i];

    if done(node.id.as_str()) {
        return NodeStatus::Completed;
    }
    if i == 0 {
        return NodeStatus::Current;
    }
    let unlocked = if node.prerequisites.is_empty() {
        done(nodes[i - 1].id.as_str())
    } else {
        node.prerequisites.iter().all(|p| done(p.as_str()))
    };
    if unlocked {
        NodeStatus::Current
    } else {
        NodeStatus::Locked
    }
}

/// Pair each node with its resolved status.
pub fn annotate<'a, I>(nodes: &[Node], completed_lesson_ids: I) -> Vec<NodeView>
where
    I: IntoIterator<Item = &'a str>,
{
    let statuses = resolve(nodes, completed_lesson_ids);
    nodes
        .iter()
        .map(|node| NodeView {
            node: node.clone(),
            status: statuses[node.id.as_str()],
        })
        .collect()
}

/// Refuse to act on a locked node.
///
/// `id` may be a node id or a lesson id. Completed nodes pass so the store can
/// answer with its own idempotent "already completed" signal.
pub fn ensure_actionable<'a, I>(
    nodes: &[Node],
    completed_lesson_ids: I,
    id: &str,
) -> Result<NodeStatus, CoreError>
where
    I: IntoIterator<Item = &'a str>,
{
    let target = lesson_id_for(id);
    let index = nodes
        .iter()
        .position(|n| lesson_id_for(&n.id) == target)
        .ok_or_else(|| CoreError::NotFound {
            entity: "Node",
            id: id.to_string(),
        })?;
    let completed = canonical_lesson_ids(completed_lesson_ids);
    match status_of(nodes, index, &completed) {
        NodeStatus::Locked => Err(CoreError::NodeLocked {
            node_id: nodes[index].id.clone(),
        }),
        status => Ok(status),
    }
}
