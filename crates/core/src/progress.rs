//! Enroll and CompleteLesson as in-memory mutations of a [`UserProfile`].
//!
//! Both functions either fail without touching the profile or apply their
//! whole effect; the caller persists the profile in a single write afterwards.

use serde::Serialize;

use crate::aliases::lesson_id_for;
use crate::catalog::CourseDefinition;
use crate::error::CoreError;
use crate::profile::{CompletedLesson, Enrollment, UserProfile};
use crate::types::Timestamp;
use crate::xp::{award, LevelRule, XpAward, ENROLLMENT_BONUS_XP};

/// `round(100 * completed / total)`, capped at 100. Zero when `total` is 0.
pub fn progress_percent(completed: usize, total: usize) -> u8 {
    if total == 0 {
        return 0;
    }
    let pct = (completed as f64 / total as f64 * 100.0).round() as u64;
    pct.min(100) as u8
}

/// Recompute `progress` from the completion history against `total` lessons.
/// Returns whether the stored value was wrong.
pub fn recompute_progress(enrollment: &mut Enrollment, total: usize) -> bool {
    let actual = progress_percent(enrollment.completed_lessons.len(), total);
    let stale = enrollment.progress != actual;
    enrollment.progress = actual;
    stale
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrollOutcome {
    pub enrollment: Enrollment,
    pub xp_gained: i64,
    #[serde(skip)]
    pub award: XpAward,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletionOutcome {
    pub enrollment: Enrollment,
    pub xp_gained: i64,
    #[serde(rename = "totalXP")]
    pub total_xp: i64,
    /// True when this completion brought the course to 100%.
    #[serde(skip)]
    pub course_completed: bool,
    #[serde(skip)]
    pub award: XpAward,
}

/// Enroll a profile in a course and grant the enrollment bonus.
pub fn enroll(
    profile: &mut UserProfile,
    course: &CourseDefinition,
    now: Timestamp,
    rule: &dyn LevelRule,
) -> Result<EnrollOutcome, CoreError> {
    if profile.is_enrolled(&course.id) {
        return Err(CoreError::AlreadyEnrolled {
            course_id: course.id.clone(),
        });
    }

    let enrollment = Enrollment::new(course.id.clone(), now);
    profile.enrolled_course_ids.push(course.id.clone());
    profile
        .enrollments
        .insert(course.id.clone(), enrollment.clone());
    let award = award(profile, ENROLLMENT_BONUS_XP, now, rule);

    Ok(EnrollOutcome {
        enrollment,
        xp_gained: award.amount,
        award,
    })
}

/// Append a lesson to the completion history and grant its xp.
///
/// `lesson_id` may be a node alias; it is stored under its canonical lesson id.
/// Progress is recomputed against the lesson count of `course`.
pub fn complete_lesson(
    profile: &mut UserProfile,
    course: &CourseDefinition,
    lesson_id: &str,
    xp_reward: i64,
    now: Timestamp,
    rule: &dyn LevelRule,
) -> Result<CompletionOutcome, CoreError> {
    let lesson_id = lesson_id_for(lesson_id);
    let total = course.total_lessons();

    let enrollment = profile
        .enrollment_mut(&course.id)
        .ok_or_else(|| CoreError::NotEnrolled {
            course_id: course.id.clone(),
        })?;
    course.require_lesson(lesson_id)?;
    if enrollment.has_completed(lesson_id) {
        return Err(CoreError::AlreadyCompleted {
            course_id: course.id.clone(),
            lesson_id: lesson_id.to_string(),
        });
    }

    let was_finished = enrollment.is_finished();
    let xp_reward = xp_reward.max(0);
    enrollment.completed_lessons.push(CompletedLesson {
        lesson_id: lesson_id.to_string(),
        completed_at: now,
        xp_earned: xp_reward,
    });
    enrollment.progress = progress_percent(enrollment.completed_lessons.len(), total);
    enrollment.last_accessed_at = now;
    let course_completed = !was_finished && enrollment.is_finished();
    let snapshot = enrollment.clone();

    let award = award(profile, xp_reward, now, rule);

    Ok(CompletionOutcome {
        enrollment: snapshot,
        xp_gained: award.amount,
        total_xp: award.total_xp,
        course_completed,
        award,
    })
}
