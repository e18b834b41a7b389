//! Node-id / lesson-id alias table.
//!
//! A few authored graphs display nodes under ids that differ from the lesson
//! ids stored in completion records. Every comparison between a node and the
//! completion history goes through [`lesson_id_for`], which maps any id to its
//! canonical lesson id. Ids not in the table are already canonical.

use std::collections::HashSet;

/// `(node_id, lesson_id)` pairs. Must stay one-to-one and must not chain.
pub const NODE_ALIASES: &[(&str, &str)] = &[
    ("ts-project", "typescript-project"),
    ("final-quiz", "ts-final-quiz"),
];

/// Map a node id (or an already-canonical lesson id) to the canonical lesson id.
pub fn lesson_id_for(id: &str) -> &str {
    NODE_ALIASES
        .iter()
        .find(|(node, _)| *node == id)
        .map(|(_, lesson)| *lesson)
        .unwrap_or(id)
}

/// Map a canonical lesson id to the node id it is displayed under.
pub fn node_id_for(lesson_id: &str) -> &str {
    NODE_ALIASES
        .iter()
        .find(|(_, lesson)| *lesson == lesson_id)
        .map(|(node, _)| *node)
        .unwrap_or(lesson_id)
}

/// Canonicalize a set of completed ids, which may contain legacy node ids.
pub fn canonical_lesson_ids<'a, I>(ids: I) -> HashSet<String>
where
    I: IntoIterator<Item = &'a str>,
{
    ids.into_iter().map(|id| lesson_id_for(id).to_string()).collect()
}
