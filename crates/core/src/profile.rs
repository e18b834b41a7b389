//! Persisted per-user aggregate.
//!
//! One [`UserProfile`] per user, stored as a single blob under
//! `user:<id>`. The blob carries no schema version; [`UserProfile::from_record`]
//! is the only way in and fills defaults for absent fields, normalizes legacy
//! completion entries (bare ids, aliased node ids, duplicates) and accepts
//! enrollments stored either as a map or as a list.

use chrono::NaiveDate;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::aliases::lesson_id_for;
use crate::catalog::Tier;
use crate::error::CoreError;
use crate::types::{DbId, Timestamp};

pub const RECORD_KEY_PREFIX: &str = "user:";

/// Level of a profile with zero xp.
pub const STARTING_LEVEL: i64 = 1;

/// Record-store key of a user's profile.
pub fn record_key(user_id: DbId) -> String {
    format!("{RECORD_KEY_PREFIX}{user_id}")
}

// ---------------------------------------------------------------------------
// Canonical shapes
// ---------------------------------------------------------------------------

/// One entry of an enrollment's append-only completion history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletedLesson {
    pub lesson_id: String,
    pub completed_at: Timestamp,
    pub xp_earned: i64,
}

/// The relationship between one user and one course.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Enrollment {
    pub course_id: String,
    pub enrolled_at: Timestamp,
    /// `round(100 * completed / total)`, 0 through 100.
    pub progress: u8,
    pub completed_lessons: Vec<CompletedLesson>,
    pub last_accessed_at: Timestamp,
}

impl Enrollment {
    pub fn new(course_id: impl Into<String>, now: Timestamp) -> Self {
        Self {
            course_id: course_id.into(),
            enrolled_at: now,
            progress: 0,
            completed_lessons: Vec::new(),
            last_accessed_at: now,
        }
    }

    /// Whether `lesson_id` (or its alias) is already in the history.
    pub fn has_completed(&self, lesson_id: &str) -> bool {
        let canonical = lesson_id_for(lesson_id);
        self.completed_lessons
            .iter()
            .any(|c| c.lesson_id == canonical)
    }

    pub fn completed_ids(&self) -> impl Iterator<Item = &str> {
        self.completed_lessons.iter().map(|c| c.lesson_id.as_str())
    }

    pub fn is_finished(&self) -> bool {
        self.progress >= 100
    }
}

/// The per-user aggregate record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: DbId,
    pub xp: i64,
    pub level: i64,
    pub current_streak: i64,
    #[serde(rename = "dailyXP")]
    pub daily_xp: i64,
    /// UTC day of the most recent xp award; drives daily reset and streaks.
    pub last_active_on: Option<NaiveDate>,
    pub subscription_tier: Tier,
    pub enrolled_course_ids: Vec<String>,
    pub enrollments: IndexMap<String, Enrollment>,
}

impl UserProfile {
    /// A fresh profile as created on first authentication.
    pub fn new(id: DbId) -> Self {
        Self {
            id,
            xp: 0,
            level: STARTING_LEVEL,
            current_streak: 0,
            daily_xp: 0,
            last_active_on: None,
            subscription_tier: Tier::Free,
            enrolled_course_ids: Vec::new(),
            enrollments: IndexMap::new(),
        }
    }

    pub fn enrollment(&self, course_id: &str) -> Option<&Enrollment> {
        self.enrollments.get(course_id)
    }

    pub fn enrollment_mut(&mut self, course_id: &str) -> Option<&mut Enrollment> {
        self.enrollments.get_mut(course_id)
    }

    /// Enrolled according to either structure. The two are checked
    /// independently because they are not written as one unit.
    pub fn is_enrolled(&self, course_id: &str) -> bool {
        self.enrolled_course_ids.iter().any(|c| c == course_id)
            || self.enrollments.contains_key(course_id)
    }

    /// Courses whose progress has reached 100.
    pub fn completed_course_ids(&self) -> Vec<String> {
        self.enrollments
            .values()
            .filter(|e| e.is_finished())
            .map(|e| e.course_id.clone())
            .collect()
    }

    /// Describe every way `enrolledCourseIds` and the enrollment keys disagree.
    /// An empty result means the record is consistent.
    pub fn consistency_issues(&self) -> Vec<String> {
        let mut issues = Vec::new();
        for (i, id) in self.enrolled_course_ids.iter().enumerate() {
            if self.enrolled_course_ids[..i].contains(id) {
                issues.push(format!("course '{id}' listed more than once"));
            }
            if !self.enrollments.contains_key(id) {
                issues.push(format!("course '{id}' listed without an enrollment"));
            }
        }
        for id in self.enrollments.keys() {
            if !self.enrolled_course_ids.contains(id) {
                issues.push(format!("enrollment for '{id}' missing from enrolledCourseIds"));
            }
        }
        issues
    }

    /// Bring `enrolledCourseIds` and the enrollment keys back into agreement
    /// and return the issues that were found.
    ///
    /// Duplicate ids are dropped, an id listed without an enrollment gets an
    /// empty enrollment dated `fallback_time`, and enrollments missing from
    /// the list are appended to it.
    pub fn repair_enrollment_index(&mut self, fallback_time: Timestamp) -> Vec<String> {
        let issues = self.consistency_issues();
        if issues.is_empty() {
            return issues;
        }

        let mut ids: Vec<String> = Vec::with_capacity(self.enrolled_course_ids.len());
        for id in self.enrolled_course_ids.drain(..) {
            if !ids.contains(&id) {
                ids.push(id);
            }
        }
        for id in &ids {
            if !self.enrollments.contains_key(id) {
                self.enrollments
                    .insert(id.clone(), Enrollment::new(id.clone(), fallback_time));
            }
        }
        for id in self.enrollments.keys() {
            if !ids.contains(id) {
                ids.push(id.clone());
            }
        }
        self.enrolled_course_ids = ids;
        issues
    }

    /// Parse a stored blob, normalizing legacy shapes.
    ///
    /// `fallback_time` stands in for timestamps missing from old records.
    pub fn from_record(
        user_id: DbId,
        body: serde_json::Value,
        fallback_time: Timestamp,
    ) -> Result<Self, CoreError> {
        let stored: StoredProfile = serde_json::from_value(body).map_err(|e| {
            CoreError::Storage(format!("Malformed profile record for user {user_id}: {e}"))
        })?;
        if let Some(id) = stored.id {
            if id != user_id {
                return Err(CoreError::Storage(format!(
                    "Profile record under user {user_id} belongs to user {id}"
                )));
            }
        }

        let entries: Vec<(Option<String>, StoredEnrollment)> = match stored.enrollments {
            StoredEnrollments::Map(map) => map.into_iter().map(|(k, v)| (Some(k), v)).collect(),
            StoredEnrollments::List(list) => list.into_iter().map(|v| (None, v)).collect(),
        };
        let mut enrollments = IndexMap::new();
        for (key, raw) in entries {
            let enrollment = raw.normalize(key, fallback_time).ok_or_else(|| {
                CoreError::Storage(format!(
                    "Enrollment without a course id in profile of user {user_id}"
                ))
            })?;
            enrollments
                .entry(enrollment.course_id.clone())
                .or_insert(enrollment);
        }

        Ok(Self {
            id: user_id,
            xp: stored.xp.max(0),
            level: stored.level.unwrap_or(STARTING_LEVEL),
            current_streak: stored.current_streak.max(0),
            daily_xp: stored.daily_xp.max(0),
            last_active_on: stored.last_active_on,
            subscription_tier: stored.subscription_tier,
            enrolled_course_ids: stored.enrolled_course_ids,
            enrollments,
        })
    }

    /// The `userCourses` view of this profile.
    pub fn courses(&self) -> UserCourses {
        UserCourses {
            enrolled_course_ids: self.enrolled_course_ids.clone(),
            enrollments: self.enrollments.clone(),
            completed_course_ids: self.completed_course_ids(),
        }
    }

    /// Serialize into the canonical stored shape.
    pub fn to_record(&self) -> Result<serde_json::Value, CoreError> {
        serde_json::to_value(self)
            .map_err(|e| CoreError::Internal(format!("Failed to serialize profile: {e}")))
    }
}

/// A user's enrollments as returned to the presentation layer.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserCourses {
    pub enrolled_course_ids: Vec<String>,
    pub enrollments: IndexMap<String, Enrollment>,
    pub completed_course_ids: Vec<String>,
}

// ---------------------------------------------------------------------------
// Stored (lenient) shapes
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredProfile {
    #[serde(default)]
    id: Option<DbId>,
    #[serde(default)]
    xp: i64,
    #[serde(default)]
    level: Option<i64>,
    #[serde(default)]
    current_streak: i64,
    #[serde(default, rename = "dailyXP")]
    daily_xp: i64,
    #[serde(default)]
    last_active_on: Option<NaiveDate>,
    #[serde(default)]
    subscription_tier: Tier,
    #[serde(default)]
    enrolled_course_ids: Vec<String>,
    #[serde(default)]
    enrollments: StoredEnrollments,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum StoredEnrollments {
    Map(IndexMap<String, StoredEnrollment>),
    List(Vec<StoredEnrollment>),
}

impl Default for StoredEnrollments {
    fn default() -> Self {
        Self::Map(IndexMap::new())
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredEnrollment {
    #[serde(default)]
    course_id: Option<String>,
    #[serde(default)]
    enrolled_at: Option<Timestamp>,
    #[serde(default)]
    progress: i64,
    #[serde(default)]
    completed_lessons: Vec<StoredCompletion>,
    #[serde(default)]
    last_accessed_at: Option<Timestamp>,
}

/// Old records hold completions either as bare ids or as full entries.
#[derive(Deserialize)]
#[serde(untagged)]
enum StoredCompletion {
    Bare(String),
    Entry(StoredCompletionEntry),
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredCompletionEntry {
    lesson_id: String,
    #[serde(default)]
    completed_at: Option<Timestamp>,
    #[serde(default)]
    xp_earned: i64,
}

impl StoredEnrollment {
    fn normalize(self, key: Option<String>, fallback_time: Timestamp) -> Option<Enrollment> {
        let course_id = self.course_id.or(key)?;
        let enrolled_at = self.enrolled_at.unwrap_or(fallback_time);

        let mut completed_lessons: Vec<CompletedLesson> = Vec::new();
        for raw in self.completed_lessons {
            let entry = match raw {
                StoredCompletion::Bare(id) => CompletedLesson {
                    lesson_id: lesson_id_for(&id).to_string(),
                    completed_at: enrolled_at,
                    xp_earned: 0,
                },
                StoredCompletion::Entry(e) => CompletedLesson {
                    lesson_id: lesson_id_for(&e.lesson_id).to_string(),
                    completed_at: e.completed_at.unwrap_or(enrolled_at),
                    xp_earned: e.xp_earned.max(0),
                },
            };
            if !completed_lessons
                .iter()
                .any(|c| c.lesson_id == entry.lesson_id)
            {
                completed_lessons.push(entry);
            }
        }

        Some(Enrollment {
            course_id,
            enrolled_at,
            progress: self.progress.clamp(0, 100) as u8,
            completed_lessons,
            last_accessed_at: self.last_accessed_at.unwrap_or(enrolled_at),
        })
    }
}
