//! In-memory catalog loaded once from a JSON document.

use std::collections::HashMap;
use std::path::Path;

use async_trait::async_trait;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use coursepath_core::catalog::{AuthoredGraph, CatalogProvider, CourseDefinition};
use coursepath_core::curriculum::build_graph;
use coursepath_core::error::CoreError;

use crate::error::CatalogError;

/// Catalog shipped with the binary.
const SEED_CATALOG: &str = include_str!("../seed/catalog.json");

/// On-disk catalog shape: courses plus the hand-built graphs of some of them.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CatalogDocument {
    pub courses: Vec<CourseDefinition>,
    #[serde(default)]
    pub graphs: Vec<AuthoredGraph>,
}

#[derive(Debug, Clone)]
pub struct StaticCatalog {
    courses: IndexMap<String, CourseDefinition>,
    graphs: HashMap<String, AuthoredGraph>,
}

impl StaticCatalog {
    /// Build a catalog, refusing any course whose graph cannot be built.
    pub fn from_document(doc: CatalogDocument) -> Result<Self, CatalogError> {
        let mut courses = IndexMap::new();
        for course in doc.courses {
            if courses.contains_key(&course.id) {
                return Err(CatalogError::Invalid(format!(
                    "Course '{}' is defined more than once",
                    course.id
                )));
            }
            courses.insert(course.id.clone(), course);
        }

        let mut graphs = HashMap::new();
        for graph in doc.graphs {
            if !courses.contains_key(&graph.course_id) {
                return Err(CatalogError::Invalid(format!(
                    "Graph supplied for unknown course '{}'",
                    graph.course_id
                )));
            }
            if graphs.insert(graph.course_id.clone(), graph).is_some() {
                return Err(CatalogError::Invalid(
                    "More than one graph supplied for a course".to_string(),
                ));
            }
        }

        for course in courses.values() {
            build_graph(course, graphs.get(&course.id))
                .map_err(|e| CatalogError::Invalid(e.to_string()))?;
        }

        Ok(Self { courses, graphs })
    }

    pub fn from_json(json: &str) -> Result<Self, CatalogError> {
        Self::from_document(serde_json::from_str(json)?)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, CatalogError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// The built-in catalog.
    pub fn seeded() -> Result<Self, CatalogError> {
        Self::from_json(SEED_CATALOG)
    }

    /// Course ids in document order.
    pub fn course_ids(&self) -> impl Iterator<Item = &str> {
        self.courses.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.courses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.courses.is_empty()
    }
}

#[async_trait]
impl CatalogProvider for StaticCatalog {
    async fn get_course(&self, course_id: &str) -> Result<Option<CourseDefinition>, CoreError> {
        Ok(self.courses.get(course_id).cloned())
    }

    async fn authored_graph(&self, course_id: &str) -> Result<Option<AuthoredGraph>, CoreError> {
        Ok(self.graphs.get(course_id).cloned())
    }
}
