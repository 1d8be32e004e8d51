//! Dashboard endpoint.

use axum::{extract::State, Extension};

use super::{success, ApiResult};
use crate::auth::CurrentUser;
use crate::db::today;
use crate::models::DashboardSummary;
use crate::AppState;

/// GET /api/dashboard
pub async fn get_dashboard(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
) -> ApiResult<DashboardSummary> {
    success(state.repo.dashboard(&user.id, today()).await?)
}
