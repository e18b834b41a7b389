//! Enrollment and lesson-completion handlers.
//!
//! Conflicts (`ALREADY_ENROLLED`, `ALREADY_COMPLETED`) are the expected
//! answer to a repeated call and leave the profile untouched.

use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;
use serde_json::json;
use validator::{Validate, ValidationError};

use coursepath_core::aliases::node_id_for;
use coursepath_core::catalog::validate_id;
use coursepath_events::{EventKind, ProgressEvent};

use crate::error::AppResult;
use crate::middleware::auth::AuthUser;
use crate::middleware::validated::ValidatedJson;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request DTOs
// ---------------------------------------------------------------------------

/// Course, lesson and node ids are lowercase slugs.
fn validate_slug(id: &str) -> Result<(), ValidationError> {
    validate_id("id", id)
        .map_err(|e| ValidationError::new("slug").with_message(e.to_string().into()))
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct EnrollRequest {
    #[validate(custom(function = "validate_slug"))]
    pub course_id: String,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CompleteLessonRequest {
    #[validate(custom(function = "validate_slug"))]
    pub course_id: String,
    #[validate(custom(function = "validate_slug"))]
    pub lesson_id: String,
    /// What the client thinks the lesson is worth. The catalog decides.
    #[validate(range(min = 0))]
    pub xp_gained: Option<i64>,
}

// ---------------------------------------------------------------------------
// Endpoints
// ---------------------------------------------------------------------------

/// POST /api/v1/enroll
///
/// `200 {enrollment, xpGained}`.
pub async fn enroll(
    user: AuthUser,
    State(state): State<AppState>,
    ValidatedJson(input): ValidatedJson<EnrollRequest>,
) -> AppResult<impl IntoResponse> {
    let outcome = state.progress.enroll(user.user_id, &input.course_id).await?;

    state.event_bus.publish(
        ProgressEvent::new(EventKind::CourseEnrolled, user.user_id, &input.course_id)
            .with_xp(outcome.xp_gained)
            .with_payload(json!({
                "totalXP": outcome.award.total_xp,
                "level": outcome.award.level,
            })),
    );

    Ok(Json(outcome))
}

/// POST /api/v1/completeLesson
///
/// `200 {enrollment, xpGained, totalXP}`.
pub async fn complete_lesson(
    user: AuthUser,
    State(state): State<AppState>,
    ValidatedJson(input): ValidatedJson<CompleteLessonRequest>,
) -> AppResult<impl IntoResponse> {
    let outcome = state
        .progress
        .complete_lesson(
            user.user_id,
            &input.course_id,
            &input.lesson_id,
            input.xp_gained,
        )
        .await?;

    let lesson_id = outcome
        .enrollment
        .completed_lessons
        .last()
        .map_or(input.lesson_id.as_str(), |c| c.lesson_id.as_str());
    state.event_bus.publish(
        ProgressEvent::new(EventKind::LessonCompleted, user.user_id, &input.course_id)
            .with_lesson(lesson_id)
            .with_xp(outcome.xp_gained)
            .with_payload(json!({
                "nodeId": node_id_for(lesson_id),
                "progress": outcome.enrollment.progress,
                "totalXP": outcome.total_xp,
                "leveledUp": outcome.award.leveled_up,
            })),
    );
    if outcome.course_completed {
        state.event_bus.publish(ProgressEvent::new(
            EventKind::CourseCompleted,
            user.user_id,
            &input.course_id,
        ));
    }

    Ok(Json(outcome))
}

/// GET /api/v1/userCourses
///
/// `200 {enrolledCourseIds, enrollments, completedCourseIds}`.
pub async fn user_courses(
    user: AuthUser,
    State(state): State<AppState>,
) -> AppResult<impl IntoResponse> {
    let courses = state.progress.user_courses(user.user_id).await?;
    Ok(Json(courses))
}
