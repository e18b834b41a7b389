//! Course catalog types and the read-only catalog collaborator.
//!
//! The catalog is ground truth for a course's lesson list, per-lesson XP and
//! required subscription tier. Lesson counts used in progress math always come
//! from a [`CourseDefinition`] returned by a [`CatalogProvider`].

use std::sync::LazyLock;

use async_trait::async_trait;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::CoreError;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// XP awarded for a lesson whose spec carries no explicit reward.
pub const DEFAULT_XP_REWARD: i64 = 100;

/// Maximum length of a course, lesson or node identifier.
pub const MAX_ID_LENGTH: usize = 128;

/// Identifiers are lowercase slugs: `python-basics`, `lesson-3`, `history`.
pub const ID_PATTERN: &str = r"^[a-z0-9][a-z0-9_-]*$";

static ID_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(ID_PATTERN).expect("valid regex"));

pub const TIER_FREE: &str = "free";
pub const TIER_PRO: &str = "pro";
pub const TIER_ENTERPRISE: &str = "enterprise";

/// All valid tier strings, lowest rank first.
pub const VALID_TIERS: &[&str] = &[TIER_FREE, TIER_PRO, TIER_ENTERPRISE];

// ---------------------------------------------------------------------------
// Enums
// ---------------------------------------------------------------------------

/// Subscription level. Declaration order is rank order.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    #[default]
    Free,
    Pro,
    Enterprise,
}

impl Tier {
    /// Parse a tier string as supplied by the subscription service.
    pub fn from_str_value(s: &str) -> Result<Self, CoreError> {
        match s {
            TIER_FREE => Ok(Self::Free),
            TIER_PRO => Ok(Self::Pro),
            TIER_ENTERPRISE => Ok(Self::Enterprise),
            _ => Err(CoreError::Validation(format!(
                "Invalid tier '{s}'. Must be one of: {}",
                VALID_TIERS.join(", ")
            ))),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Free => TIER_FREE,
            Self::Pro => TIER_PRO,
            Self::Enterprise => TIER_ENTERPRISE,
        }
    }

    /// Ordinal rank: free < pro < enterprise.
    pub fn rank(&self) -> u8 {
        match self {
            Self::Free => 0,
            Self::Pro => 1,
            Self::Enterprise => 2,
        }
    }
}

impl std::fmt::Display for Tier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kind of learning activity a node represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActivityType {
    Reading,
    Practice,
    Project,
    Quiz,
    Checkpoint,
}

// ---------------------------------------------------------------------------
// Catalog entries
// ---------------------------------------------------------------------------

/// One lesson in a course's authoring order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LessonSpec {
    pub id: String,
    pub activity_type: ActivityType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub xp_reward: Option<i64>,
}

impl LessonSpec {
    /// The XP this lesson awards, falling back to [`DEFAULT_XP_REWARD`].
    pub fn xp(&self) -> i64 {
        self.xp_reward.unwrap_or(DEFAULT_XP_REWARD)
    }
}

/// A course as supplied by the catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseDefinition {
    pub id: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub difficulty: Option<String>,
    #[serde(default)]
    pub required_tier: Tier,
    pub lessons: Vec<LessonSpec>,
}

impl CourseDefinition {
    /// Number of lessons in the course; the denominator of progress.
    pub fn total_lessons(&self) -> usize {
        self.lessons.len()
    }

    pub fn lesson(&self, lesson_id: &str) -> Option<&LessonSpec> {
        self.lessons.iter().find(|l| l.id == lesson_id)
    }

    /// Look up a lesson, failing with `NotFound` when the course has no such lesson.
    pub fn require_lesson(&self, lesson_id: &str) -> Result<&LessonSpec, CoreError> {
        self.lesson(lesson_id).ok_or_else(|| CoreError::NotFound {
            entity: "Lesson",
            id: format!("{}/{lesson_id}", self.id),
        })
    }

    /// Check identifiers and lesson-id uniqueness.
    pub fn validate(&self) -> Result<(), CoreError> {
        validate_id("course", &self.id)?;
        if self.lessons.is_empty() {
            return Err(CoreError::Validation(format!(
                "Course '{}' has no lessons",
                self.id
            )));
        }
        let mut seen = std::collections::HashSet::new();
        for lesson in &self.lessons {
            validate_id("lesson", &lesson.id)?;
            if !seen.insert(lesson.id.as_str()) {
                return Err(CoreError::Validation(format!(
                    "Course '{}' lists lesson '{}' more than once",
                    self.id, lesson.id
                )));
            }
            if lesson.xp() < 0 {
                return Err(CoreError::Validation(format!(
                    "Lesson '{}' has a negative xp reward",
                    lesson.id
                )));
            }
        }
        Ok(())
    }
}

/// One node of a hand-built graph. Node ids may be display aliases of lesson ids.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthoredNode {
    pub id: String,
    pub activity_type: ActivityType,
    #[serde(default)]
    pub prerequisites: Vec<String>,
}

/// A hand-built progression graph for a specific course, in authoring order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthoredGraph {
    pub course_id: String,
    pub nodes: Vec<AuthoredNode>,
}

// ---------------------------------------------------------------------------
// Collaborator trait
// ---------------------------------------------------------------------------

/// Read-only source of course definitions.
#[async_trait]
pub trait CatalogProvider: Send + Sync {
    /// Fetch a course by id. `Ok(None)` means the course does not exist.
    async fn get_course(&self, course_id: &str) -> Result<Option<CourseDefinition>, CoreError>;

    /// Fetch the hand-built graph for a course, if one was authored.
    async fn authored_graph(&self, course_id: &str) -> Result<Option<AuthoredGraph>, CoreError>;
}

/// Fetch a course or fail with `NotFound`.
pub async fn require_course(
    catalog: &dyn CatalogProvider,
    course_id: &str,
) -> Result<CourseDefinition, CoreError> {
    catalog
        .get_course(course_id)
        .await?
        .ok_or_else(|| CoreError::NotFound {
            entity: "Course",
            id: course_id.to_string(),
        })
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

/// Validate a course, lesson or node identifier.
pub fn validate_id(kind: &str, id: &str) -> Result<(), CoreError> {
    if id.is_empty() {
        return Err(CoreError::Validation(format!("{kind} id must not be empty")));
    }
    if id.len() > MAX_ID_LENGTH {
        return Err(CoreError::Validation(format!(
            "{kind} id exceeds maximum length of {MAX_ID_LENGTH} characters (got {})",
            id.len()
        )));
    }
    if !ID_RE.is_match(id) {
        return Err(CoreError::Validation(format!(
            "{kind} id '{id}' must be a lowercase slug"
        )));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    fn lesson(id: &str, xp: Option<i64>) -> LessonSpec {
        LessonSpec {
            id: id.to_string(),
            activity_type: ActivityType::Reading,
            xp_reward: xp,
        }
    }

    fn course(lessons: Vec<LessonSpec>) -> CourseDefinition {
        CourseDefinition {
            id: "python-basics".to_string(),
            title: "Python Basics".to_string(),
            difficulty: None,
            required_tier: Tier::Free,
            lessons,
        }
    }

    #[test]
    fn tier_ranks_are_ordered() {
        assert!(Tier::Free.rank() < Tier::Pro.rank());
        assert!(Tier::Pro.rank() < Tier::Enterprise.rank());
        assert!(Tier::Free < Tier::Enterprise);
    }

    #[test]
    fn tier_parses_known_values() {
        assert_eq!(Tier::from_str_value("pro").unwrap(), Tier::Pro);
        assert_matches!(Tier::from_str_value("gold"), Err(CoreError::Validation(_)));
    }

    #[test]
    fn tier_defaults_to_free_when_absent() {
        let json = r#"{"id":"c","title":"C","lessons":[{"id":"a","activityType":"quiz"}]}"#;
        let parsed: CourseDefinition = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.required_tier, Tier::Free);
        assert_eq!(parsed.lessons[0].activity_type, ActivityType::Quiz);
    }

    #[test]
    fn missing_xp_reward_uses_default() {
        assert_eq!(lesson("a", None).xp(), DEFAULT_XP_REWARD);
        assert_eq!(lesson("a", Some(40)).xp(), 40);
    }

    #[test]
    fn total_lessons_counts_catalog_entries() {
        let c = course(vec![lesson("a", None), lesson("b", None), lesson("c", None)]);
        assert_eq!(c.total_lessons(), 3);
    }

    #[test]
    fn require_lesson_reports_unknown_lesson() {
        let c = course(vec![lesson("a", None)]);
        assert_matches!(
            c.require_lesson("zzz"),
            Err(CoreError::NotFound { entity: "Lesson", .. })
        );
    }

    #[test]
    fn validate_rejects_duplicate_lessons() {
        let c = course(vec![lesson("a", None), lesson("a", None)]);
        assert_matches!(c.validate(), Err(CoreError::Validation(_)));
    }

    #[test]
    fn validate_rejects_empty_course() {
        assert_matches!(course(vec![]).validate(), Err(CoreError::Validation(_)));
    }

    #[test]
    fn id_validation() {
        assert!(validate_id("course", "python-basics").is_ok());
        assert!(validate_id("lesson", "lesson_2").is_ok());
        assert!(validate_id("course", "").is_err());
        assert!(validate_id("course", "Python Basics").is_err());
        assert!(validate_id("course", &"a".repeat(MAX_ID_LENGTH + 1)).is_err());
    }
}
