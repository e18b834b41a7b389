//! Enrollment & progress store over the per-user profile record.
//!
//! Every mutation is one read, one in-memory change and one versioned write,
//! performed while holding the user's lock from [`UserLocks`]. A write that
//! still loses a version race (another process sharing the store) fails with
//! `StaleRecord`; nothing here retries.

use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;

use coursepath_core::aliases::lesson_id_for;
use coursepath_core::catalog::{require_course, CatalogProvider, CourseDefinition};
use coursepath_core::curriculum::{build_graph, Node};
use coursepath_core::error::CoreError;
use coursepath_core::profile::{record_key, UserCourses, UserProfile};
use coursepath_core::progress::{self, recompute_progress, CompletionOutcome, EnrollOutcome};
use coursepath_core::status::{annotate, ensure_actionable, NodeView};
use coursepath_core::tier::{check_access, SubscriptionProvider};
use coursepath_core::types::DbId;
use coursepath_core::xp::{summarize, LevelRule, ProfileSummary};

use crate::locks::UserLocks;
use crate::store::{RecordStore, StoreError, NEW_RECORD_VERSION};

/// A course graph with every node's status for one user.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseGraph {
    pub course_id: String,
    pub title: String,
    pub enrolled: bool,
    pub progress: u8,
    pub nodes: Vec<NodeView>,
}

pub struct ProgressRepo {
    store: Arc<dyn RecordStore>,
    catalog: Arc<dyn CatalogProvider>,
    subscriptions: Arc<dyn SubscriptionProvider>,
    level_rule: Arc<dyn LevelRule>,
    locks: UserLocks,
}

impl ProgressRepo {
    pub fn new(
        store: Arc<dyn RecordStore>,
        catalog: Arc<dyn CatalogProvider>,
        subscriptions: Arc<dyn SubscriptionProvider>,
        level_rule: Arc<dyn LevelRule>,
    ) -> Self {
        Self {
            store,
            catalog,
            subscriptions,
            level_rule,
            locks: UserLocks::new(),
        }
    }

    pub fn catalog(&self) -> &Arc<dyn CatalogProvider> {
        &self.catalog
    }

    // -----------------------------------------------------------------------
    // Record access
    // -----------------------------------------------------------------------

    /// Read and normalize a profile together with the version it was read at.
    /// A user without a record gets a fresh profile at version 0.
    async fn load(&self, user_id: DbId) -> Result<(UserProfile, i64), CoreError> {
        let key = record_key(user_id);
        let record = self.store.get(&key).await.map_err(|e| {
            tracing::error!(user_id, error = %e, "Failed to read profile record");
            CoreError::from(e)
        })?;

        let Some(record) = record else {
            return Ok((UserProfile::new(user_id), NEW_RECORD_VERSION));
        };
        let now = Utc::now();
        let mut profile = UserProfile::from_record(user_id, record.body, now).map_err(|e| {
            tracing::error!(user_id, error = %e, "Malformed profile record");
            e
        })?;
        let issues = profile.repair_enrollment_index(now);
        if !issues.is_empty() {
            tracing::warn!(user_id, ?issues, "Profile enrollment structures disagree");
        }
        self.refresh_progress(&mut profile).await?;
        Ok((profile, record.version))
    }

    /// Recompute every enrollment's progress against the catalog's lesson
    /// count. Enrollments in courses the catalog no longer has keep their
    /// stored value.
    async fn refresh_progress(&self, profile: &mut UserProfile) -> Result<(), CoreError> {
        let user_id = profile.id;
        for enrollment in profile.enrollments.values_mut() {
            let Some(course) = self.catalog.get_course(&enrollment.course_id).await? else {
                tracing::warn!(
                    user_id,
                    course_id = %enrollment.course_id,
                    "Enrollment in a course missing from the catalog"
                );
                continue;
            };
            let stored = enrollment.progress;
            if recompute_progress(enrollment, course.total_lessons()) {
                tracing::warn!(
                    user_id,
                    course_id = %enrollment.course_id,
                    stored,
                    progress = enrollment.progress,
                    "Stored progress disagreed with completions"
                );
            }
        }
        Ok(())
    }

    async fn save(&self, profile: &UserProfile, version: i64) -> Result<i64, CoreError> {
        let key = record_key(profile.id);
        let body = profile.to_record()?;
        match self.store.put(&key, body, version).await {
            Ok(next) => Ok(next),
            Err(e @ StoreError::VersionConflict { .. }) => {
                tracing::warn!(user_id = profile.id, error = %e, "Stale profile write refused");
                Err(e.into())
            }
            Err(e) => {
                tracing::error!(user_id = profile.id, error = %e, "Failed to write profile record");
                Err(e.into())
            }
        }
    }

    /// The stored profile, or a fresh default one.
    pub async fn get_profile(&self, user_id: DbId) -> Result<UserProfile, CoreError> {
        Ok(self.load(user_id).await?.0)
    }

    pub async fn profile_summary(&self, user_id: DbId) -> Result<ProfileSummary, CoreError> {
        let profile = self.get_profile(user_id).await?;
        Ok(summarize(&profile, Utc::now(), self.level_rule.as_ref()))
    }

    pub async fn user_courses(&self, user_id: DbId) -> Result<UserCourses, CoreError> {
        Ok(self.get_profile(user_id).await?.courses())
    }

    // -----------------------------------------------------------------------
    // Gates
    // -----------------------------------------------------------------------

    /// Look up the course and refuse it when the user's tier is too low.
    async fn gated_course(
        &self,
        user_id: DbId,
        course_id: &str,
    ) -> Result<CourseDefinition, CoreError> {
        let course = require_course(self.catalog.as_ref(), course_id).await?;
        let tier = self.subscriptions.current_tier(user_id).await?;
        check_access(&course, tier).map_err(|e| {
            tracing::debug!(user_id, course_id, %tier, "Course refused by tier gate");
            e
        })?;
        Ok(course)
    }

    async fn graph_for(&self, course: &CourseDefinition) -> Result<Vec<Node>, CoreError> {
        let authored = self.catalog.authored_graph(&course.id).await?;
        build_graph(course, authored.as_ref())
    }

    // -----------------------------------------------------------------------
    // Operations
    // -----------------------------------------------------------------------

    /// The course graph with per-node status for `user_id`.
    ///
    /// A user who is not enrolled sees the graph as of zero completions.
    pub async fn course_graph(
        &self,
        user_id: DbId,
        course_id: &str,
    ) -> Result<CourseGraph, CoreError> {
        let course = self.gated_course(user_id, course_id).await?;
        let nodes = self.graph_for(&course).await?;
        let profile = self.get_profile(user_id).await?;
        let enrollment = profile.enrollment(&course.id);

        let nodes = match enrollment {
            Some(e) => annotate(&nodes, e.completed_ids()),
            None => annotate(&nodes, std::iter::empty()),
        };
        Ok(CourseGraph {
            course_id: course.id,
            title: course.title,
            enrolled: enrollment.is_some(),
            progress: enrollment.map_or(0, |e| e.progress),
            nodes,
        })
    }

    /// Enroll a user in a course, granting the enrollment bonus exactly once.
    pub async fn enroll(&self, user_id: DbId, course_id: &str) -> Result<EnrollOutcome, CoreError> {
        let course = self.gated_course(user_id, course_id).await?;

        let _guard = self.locks.acquire(user_id).await;
        let (mut profile, version) = self.load(user_id).await?;
        let outcome = progress::enroll(&mut profile, &course, Utc::now(), self.level_rule.as_ref())
            .map_err(|e| refused(user_id, course_id, None, e))?;
        self.save(&profile, version).await?;

        tracing::info!(
            user_id,
            course_id,
            xp = outcome.xp_gained,
            total_xp = outcome.award.total_xp,
            "User enrolled"
        );
        Ok(outcome)
    }

    /// Record a lesson completion and award the catalog's xp for it.
    ///
    /// `claimed_xp` is what the client believes the lesson is worth; it is
    /// logged when it disagrees with the catalog and otherwise ignored.
    pub async fn complete_lesson(
        &self,
        user_id: DbId,
        course_id: &str,
        lesson_id: &str,
        claimed_xp: Option<i64>,
    ) -> Result<CompletionOutcome, CoreError> {
        let course = self.gated_course(user_id, course_id).await?;
        let xp_reward = course.require_lesson(lesson_id_for(lesson_id))?.xp();
        if let Some(claimed) = claimed_xp.filter(|c| *c != xp_reward) {
            tracing::warn!(
                user_id,
                course_id,
                lesson_id,
                claimed,
                xp_reward,
                "Client xp differs from catalog; using catalog value"
            );
        }
        let nodes = self.graph_for(&course).await?;

        let _guard = self.locks.acquire(user_id).await;
        let (mut profile, version) = self.load(user_id).await?;
        if let Some(enrollment) = profile.enrollment(&course.id) {
            ensure_actionable(&nodes, enrollment.completed_ids(), lesson_id).map_err(|e| {
                tracing::debug!(user_id, course_id, lesson_id, "Completion refused: node locked");
                e
            })?;
        }
        let outcome = progress::complete_lesson(
            &mut profile,
            &course,
            lesson_id,
            xp_reward,
            Utc::now(),
            self.level_rule.as_ref(),
        )
        .map_err(|e| refused(user_id, course_id, Some(lesson_id), e))?;
        self.save(&profile, version).await?;

        tracing::info!(
            user_id,
            course_id,
            lesson_id,
            xp = outcome.xp_gained,
            progress = outcome.enrollment.progress,
            "Lesson completed"
        );
        Ok(outcome)
    }
}

/// Log a refused mutation. Repeats of an already-applied operation are routine;
/// anything else is worth a warning.
fn refused(user_id: DbId, course_id: &str, lesson_id: Option<&str>, e: CoreError) -> CoreError {
    if e.is_conflict() {
        tracing::debug!(user_id, course_id, lesson_id, error = %e, "Mutation refused as a repeat");
    } else {
        tracing::warn!(user_id, course_id, lesson_id, error = %e, "Mutation refused");
    }
    e
}
