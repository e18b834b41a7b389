pub mod courses;
pub mod health;
pub mod profile;
pub mod progress;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// ```text
/// /courses/{course_id}                 course detail (public)
/// /courses/{course_id}/graph           graph with node status (auth, tier-gated)
///
/// /enroll                              enroll (POST, auth)
/// /completeLesson                      complete a lesson (POST, auth)
/// /userCourses                         enrollments of the caller (auth)
///
/// /user/profile                        xp, level, streak, tier (auth)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/courses", courses::router())
        .merge(progress::router())
        .nest("/user", profile::router())
}
