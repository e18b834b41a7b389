use axum::routing::get;
use axum::Router;

use crate::handlers::courses;
use crate::state::AppState;

/// Routes mounted at `/courses`.
///
/// ```text
/// GET    /{course_id}          -> get_course
/// GET    /{course_id}/graph    -> get_course_graph
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/{course_id}", get(courses::get_course))
        .route("/{course_id}/graph", get(courses::get_course_graph))
}
