//! Course catalog and graph handlers.

use axum::extract::{Path, State};
use axum::response::IntoResponse;
use axum::Json;

use coursepath_core::catalog::{require_course, validate_id};

use crate::error::AppResult;
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

/// GET /api/v1/courses/{course_id}
///
/// Public catalog entry. Not tier-gated: the course card (and its required
/// tier) is what the upgrade prompt is shown next to.
pub async fn get_course(
    State(state): State<AppState>,
    Path(course_id): Path<String>,
) -> AppResult<impl IntoResponse> {
    validate_id("course", &course_id)?;
    let course = require_course(state.catalog.as_ref(), &course_id).await?;
    Ok(Json(DataResponse { data: course }))
}

/// GET /api/v1/courses/{course_id}/graph
///
/// The progression graph with every node's status for the caller. Refused
/// with `UPGRADE_REQUIRED` when the caller's tier is below the course's.
pub async fn get_course_graph(
    user: AuthUser,
    State(state): State<AppState>,
    Path(course_id): Path<String>,
) -> AppResult<impl IntoResponse> {
    validate_id("course", &course_id)?;
    let graph = state.progress.course_graph(user.user_id, &course_id).await?;
    Ok(Json(DataResponse { data: graph }))
}
