//! Curriculum graph construction.
//!
//! Turns a [`CourseDefinition`] (and, for some courses, a hand-built
//! [`AuthoredGraph`]) into an ordered list of [`Node`]s. The graph is derived
//! data: it is rebuilt from the catalog on demand and never persisted.
//!
//! Every produced graph is acyclic and every node is reachable from the first
//! node. A node without explicit prerequisites (other than the first) is gated
//! by the node immediately before it in authoring order; that implicit edge
//! counts for both the cycle and the reachability checks.

use std::collections::{HashMap, HashSet, VecDeque};

use serde::{Deserialize, Serialize};

use crate::aliases::lesson_id_for;
use crate::catalog::{ActivityType, AuthoredGraph, CourseDefinition};
use crate::error::CoreError;

/// One learning activity in a course graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Node {
    pub id: String,
    pub activity_type: ActivityType,
    pub xp_reward: i64,
    /// Node ids that must be completed first. Empty for the first node and
    /// for implicitly sequential nodes.
    pub prerequisites: Vec<String>,
    /// Node ids this node unlocks (explicit and implicit edges).
    pub connections: Vec<String>,
}

/// Build the progression graph for a course.
///
/// Without an authored graph the course becomes a strictly linear chain.
pub fn build_graph(
    course: &CourseDefinition,
    authored: Option<&AuthoredGraph>,
) -> Result<Vec<Node>, CoreError> {
    course.validate()?;
    let nodes = match authored {
        None => build_linear(course),
        Some(graph) => build_authored(course, graph)?,
    };
    validate_graph(&nodes)?;
    Ok(nodes)
}

/// Node *i* requires node *i-1* and connects to node *i+1*.
fn build_linear(course: &CourseDefinition) -> Vec<Node> {
    let lessons = &course.lessons;
    lessons
        .iter()
        .enumerate()
        .map(|(i, lesson)| Node {
            id: lesson.id.clone(),
            activity_type: lesson.activity_type,
            xp_reward: lesson.xp(),
            prerequisites: i
                .checked_sub(1)
                .map(|prev| vec![lessons[prev].id.clone()])
                .unwrap_or_default(),
            connections: lessons
                .get(i + 1)
                .map(|next| vec![next.id.clone()])
                .unwrap_or_default(),
        })
        .collect()
}

fn build_authored(
    course: &CourseDefinition,
    graph: &AuthoredGraph,
) -> Result<Vec<Node>, CoreError> {
    if graph.course_id != course.id {
        return Err(CoreError::Validation(format!(
            "Authored graph for '{}' supplied for course '{}'",
            graph.course_id, course.id
        )));
    }
    if graph.nodes.len() != course.total_lessons() {
        return Err(CoreError::Validation(format!(
            "Authored graph for '{}' has {} nodes but the course has {} lessons",
            course.id,
            graph.nodes.len(),
            course.total_lessons()
        )));
    }

    let mut node_ids = HashSet::new();
    let mut lesson_ids = HashSet::new();
    for node in &graph.nodes {
        if !node_ids.insert(node.id.as_str()) {
            return Err(CoreError::Validation(format!(
                "Duplicate node id '{}' in graph for '{}'",
                node.id, course.id
            )));
        }
        let lesson_id = lesson_id_for(&node.id);
        course.lesson(lesson_id).ok_or_else(|| {
            CoreError::Validation(format!(
                "Node '{}' does not correspond to any lesson of '{}'",
                node.id, course.id
            ))
        })?;
        if !lesson_ids.insert(lesson_id) {
            return Err(CoreError::Validation(format!(
                "Lesson '{lesson_id}' appears under more than one node in '{}'",
                course.id
            )));
        }
    }

    if let Some(first) = graph.nodes.first() {
        if !first.prerequisites.is_empty() {
            return Err(CoreError::Validation(format!(
                "First node '{}' of '{}' must not have prerequisites",
                first.id, course.id
            )));
        }
    }

    let mut nodes: Vec<Node> = Vec::with_capacity(graph.nodes.len());
    for authored in &graph.nodes {
        let mut prerequisites: Vec<String> = Vec::new();
        for prereq in &authored.prerequisites {
            if !node_ids.contains(prereq.as_str()) {
                return Err(CoreError::Validation(format!(
                    "Node '{}' requires unknown node '{prereq}'",
                    authored.id
                )));
            }
            if prereq == &authored.id {
                return Err(CoreError::Validation(format!(
                    "Node '{}' lists itself as a prerequisite",
                    authored.id
                )));
            }
            if !prerequisites.contains(prereq) {
                prerequisites.push(prereq.clone());
            }
        }
        let lesson = course.require_lesson(lesson_id_for(&authored.id))?;
        nodes.push(Node {
            id: authored.id.clone(),
            activity_type: authored.activity_type,
            xp_reward: lesson.xp(),
            prerequisites,
            connections: Vec::new(),
        });
    }

    for (from, to) in gating_edges(&nodes) {
        let downstream = nodes[to].id.clone();
        let upstream = &mut nodes[from];
        if !upstream.connections.contains(&downstream) {
            upstream.connections.push(downstream);
        }
    }
    Ok(nodes)
}

/// All `(upstream, downstream)` index pairs that gate a node, including the
/// implicit edge from the preceding node for nodes without prerequisites.
fn gating_edges(nodes: &[Node]) -> Vec<(usize, usize)> {
    let index: HashMap<&str, usize> = nodes
        .iter()
        .enumerate()
        .map(|(i, n)| (n.id.as_str(), i))
        .collect();
    let mut edges = Vec::new();
    for (i, node) in nodes.iter().enumerate() {
        if node.prerequisites.is_empty() {
            if i > 0 {
                edges.push((i - 1, i));
            }
        } else {
            for prereq in &node.prerequisites {
                if let Some(&from) = index.get(prereq.as_str()) {
                    edges.push((from, i));
                }
            }
        }
    }
    edges
}

/// Check the builder contract: no cycles, every node reachable from the first.
pub fn validate_graph(nodes: &[Node]) -> Result<(), CoreError> {
    if nodes.is_empty() {
        return Err(CoreError::Validation("Graph has no nodes".to_string()));
    }
    let edges = gating_edges(nodes);
    let mut outgoing: Vec<Vec<usize>> = vec![Vec::new(); nodes.len()];
    let mut in_degree = vec![0usize; nodes.len()];
    for &(from, to) in &edges {
        outgoing[from].push(to);
        in_degree[to] += 1;
    }

    // Kahn's algorithm: anything left unvisited sits on a cycle.
    let mut queue: VecDeque<usize> = (0..nodes.len()).filter(|&i| in_degree[i] == 0).collect();
    let mut visited = 0usize;
    while let Some(i) = queue.pop_front() {
        visited += 1;
        for &next in &outgoing[i] {
            in_degree[next] -= 1;
            if in_degree[next] == 0 {
                queue.push_back(next);
            }
        }
    }
    if visited != nodes.len() {
        let cyclic: Vec<&str> = (0..nodes.len())
            .filter(|&i| in_degree[i] > 0)
            .map(|i| nodes[i].id.as_str())
            .collect();
        return Err(CoreError::Validation(format!(
            "Graph contains a cycle through: {}",
            cyclic.join(", ")
        )));
    }

    let mut reached = vec![false; nodes.len()];
    let mut queue = VecDeque::from([0usize]);
    reached[0] = true;
    while let Some(i) = queue.pop_front() {
        for &next in &outgoing[i] {
            if !reached[next] {
                reached[next] = true;
                queue.push_back(next);
            }
        }
    }
    if let Some(orphan) = reached.iter().position(|r| !r) {
        return Err(CoreError::Validation(format!(
            "Node '{}' is unreachable from '{}'",
            nodes[orphan].id, nodes[0].id
        )));
    }
    Ok(())
}
