use crate::{
    error::Result,
    models::{
        notification::{Notification, NotificationQuery},
        response::ApiResponse,
    },
    state::AppState,
    utils::identity::CurrentUser,
};
use axum::{
    extract::{Path, Query, State},
    routing::{get, post},
    Router,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::debug;
use validator::Validate;

const DEFAULT_LIMIT: usize = 20;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(list_notifications))
        .route("/unread-count", get(get_unread_count))
        .route("/read-all", post(mark_all_as_read))
        .route("/:id/read", post(mark_as_read))
        .route("/:id/unread", post(mark_as_unread))
}

/// 获取通知列表
/// GET /api/lms/notifications
pub async fn list_notifications(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Query(query): Query<NotificationQuery>,
) -> Result<ApiResponse<Vec<Notification>>> {
    query.validate()?;
    let limit = query.limit.unwrap_or(DEFAULT_LIMIT);
    debug!("Fetching notifications for user {} (limit {})", user.id, limit);

    let notifications = state.notification_service.get_user_notifications(&user.id, limit).await?;
    Ok(ApiResponse::success(notifications))
}

/// GET /api/lms/notifications/unread-count
pub async fn get_unread_count(State(state): State<Arc<AppState>>, user: CurrentUser) -> Result<ApiResponse<Value>> {
    let count = state.notification_service.get_unread_count(&user.id).await?;
    Ok(ApiResponse::success(json!({ "count": count })))
}

/// POST /api/lms/notifications/:id/read
pub async fn mark_as_read(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Path(notification_id): Path<String>,
) -> Result<ApiResponse<Value>> {
    state.notification_service.mark_as_read(&user.id, &notification_id).await?;

    if let Some(session) = state.existing_session(&user.id) {
        session.shell.lock().bell().decrement();
    }
    Ok(ApiResponse::success_with_message(json!({ "id": notification_id }), "Notification marked as read"))
}

/// POST /api/lms/notifications/:id/unread
pub async fn mark_as_unread(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Path(notification_id): Path<String>,
) -> Result<ApiResponse<Value>> {
    state.notification_service.mark_as_unread(&user.id, &notification_id).await?;
    Ok(ApiResponse::success_with_message(json!({ "id": notification_id }), "Notification marked as unread"))
}

/// POST /api/lms/notifications/read-all
pub async fn mark_all_as_read(State(state): State<Arc<AppState>>, user: CurrentUser) -> Result<ApiResponse<Value>> {
    let updated = state.notification_service.mark_all_as_read(&user.id).await?;

    if let Some(session) = state.existing_session(&user.id) {
        session.shell.lock().bell().clear();
    }
    Ok(ApiResponse::success(json!({ "updated": updated })))
}
