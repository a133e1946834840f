use crate::{
    error::{AppError, Result},
    models::response::ApiResponse,
    state::AppState,
    utils::identity::CurrentUser,
    views::{DashboardState, RefreshOutcome},
};
use axum::{extract::State, routing::get, Router};
use std::sync::Arc;
use tracing::debug;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(get_dashboard))
        .route("/state", get(get_dashboard_state))
}

/// 重新聚合仪表盘
/// GET /api/lms/dashboard
pub async fn get_dashboard(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
) -> Result<ApiResponse<DashboardState>> {
    let session = state.session(&user.id);
    let outcome = session.dashboard.refresh(&user.id).await;
    let snapshot = session.dashboard.snapshot();

    match outcome {
        RefreshOutcome::Committed => Ok(ApiResponse::success(snapshot)),
        RefreshOutcome::Superseded => {
            debug!("Dashboard refresh for user {} was superseded", user.id);
            Ok(ApiResponse::success_with_message(snapshot, "A newer refresh is in progress"))
        }
        RefreshOutcome::Failed => Err(snapshot.error.map(AppError::LoadFailed).unwrap_or_else(AppError::load_failed)),
    }
}

/// 最近一次提交的仪表盘状态，不触发刷新
/// GET /api/lms/dashboard/state
pub async fn get_dashboard_state(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
) -> Result<ApiResponse<DashboardState>> {
    let snapshot = state
        .existing_session(&user.id)
        .map(|session| session.dashboard.snapshot())
        .unwrap_or_default();
    Ok(ApiResponse::success(snapshot))
}
