//! Shared response envelope types for API handlers.
//!
//! Read endpoints answer with a `{ "data": ... }` envelope. The enroll,
//! completeLesson and userCourses endpoints return their payload bare, as
//! their clients expect.

use serde::Serialize;

/// Standard `{ "data": T }` response envelope.
///
/// ```ignore
/// Ok(Json(DataResponse { data: course }))
/// ```
#[derive(Debug, Serialize)]
pub struct DataResponse<T: Serialize> {
    pub data: T,
}
