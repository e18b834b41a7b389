use axum::routing::{get, post};
use axum::Router;

use crate::handlers::progress;
use crate::state::AppState;

/// Enrollment and completion routes, mounted at the API root.
///
/// ```text
/// POST   /enroll            -> enroll
/// POST   /completeLesson    -> complete_lesson
/// GET    /userCourses       -> user_courses
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/enroll", post(progress::enroll))
        .route("/completeLesson", post(progress::complete_lesson))
        .route("/userCourses", get(progress::user_courses))
}
