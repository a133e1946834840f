use crate::{
    error::{AppError, Result},
    models::response::ApiResponse,
    state::AppState,
    utils::identity::CurrentUser,
    views::{ShellState, Tab},
};
use axum::{
    extract::{Path, State},
    routing::{get, post},
    Router,
};
use serde_json::{json, Value};
use std::sync::Arc;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(get_shell).delete(close_session))
        .route("/tab/:tab", post(switch_tab))
        .route("/bell/toggle", post(toggle_bell))
        .route("/bell/dismiss", post(dismiss_bell))
}

/// 外壳状态；首次访问时创建会话并开始通知轮询
/// GET /api/lms/shell
pub async fn get_shell(State(state): State<Arc<AppState>>, user: CurrentUser) -> Result<ApiResponse<ShellState>> {
    let session = state.session(&user.id);
    let shell_state = session.shell.lock().state();
    Ok(ApiResponse::success(shell_state))
}

/// POST /api/lms/shell/tab/:tab
pub async fn switch_tab(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Path(tab): Path<String>,
) -> Result<ApiResponse<ShellState>> {
    let tab: Tab = tab.parse()?;
    let session = state.session(&user.id);
    let mut shell = session.shell.lock();
    shell.switch_to(tab);
    Ok(ApiResponse::success(shell.state()))
}

/// POST /api/lms/shell/bell/toggle
pub async fn toggle_bell(State(state): State<Arc<AppState>>, user: CurrentUser) -> Result<ApiResponse<ShellState>> {
    let session = state.session(&user.id);
    let mut shell = session.shell.lock();
    shell.bell_mut().toggle();
    Ok(ApiResponse::success(shell.state()))
}

/// 点击下拉面板以外的区域
/// POST /api/lms/shell/bell/dismiss
pub async fn dismiss_bell(State(state): State<Arc<AppState>>, user: CurrentUser) -> Result<ApiResponse<ShellState>> {
    let session = state.session(&user.id);
    let mut shell = session.shell.lock();
    shell.bell_mut().dismiss_outside();
    Ok(ApiResponse::success(shell.state()))
}

/// 关闭会话，停止通知轮询
/// DELETE /api/lms/shell
pub async fn close_session(State(state): State<Arc<AppState>>, user: CurrentUser) -> Result<ApiResponse<Value>> {
    if !state.end_session(&user.id) {
        return Err(AppError::not_found("Session"));
    }
    Ok(ApiResponse::success_with_message(json!({ "userId": user.id }), "Session closed"))
}
