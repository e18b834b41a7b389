use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;

use crate::error::AppResult;
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

/// GET /api/v1/user/profile
///
/// XP, level, streak, daily XP and tier of the caller. A user with no stored
/// record gets the starting profile.
pub async fn get_profile(
    user: AuthUser,
    State(state): State<AppState>,
) -> AppResult<impl IntoResponse> {
    let summary = state.progress.profile_summary(user.user_id).await?;
    Ok(Json(DataResponse { data: summary }))
}
