use crate::{
    error::{AppError, Result},
    models::notification::Notification,
    services::store::{decode_all, DocumentQuery, SharedStore, SortDirection},
};
use chrono::Utc;
use serde_json::json;
use tracing::{debug, info};

pub const NOTIFICATIONS: &str = "notifications";

#[derive(Clone)]
pub struct NotificationService {
    store: SharedStore,
}

impl NotificationService {
    pub async fn new(store: SharedStore) -> Result<Self> {
        Ok(Self { store })
    }

    /// 未读通知数（不设上限，用于顶部铃铛徽标）
    pub async fn get_unread_count(&self, user_id: &str) -> Result<usize> {
        Ok(self.unread_documents(user_id).await?.len())
    }

    /// 最新的通知，按创建时间倒序
    pub async fn get_user_notifications(&self, user_id: &str, limit: usize) -> Result<Vec<Notification>> {
        debug!("Fetching {} notifications for user: {}", limit, user_id);
        let query = DocumentQuery::collection(NOTIFICATIONS)
            .filter_eq("userId", user_id)
            .order_by("createdAt", SortDirection::Desc)
            .limit(limit);
        decode_all(self.store.query(&query).await?)
    }

    /// 标记单条通知为已读；不属于该用户的通知按不存在处理
    pub async fn mark_as_read(&self, user_id: &str, notification_id: &str) -> Result<()> {
        self.ensure_owner(user_id, notification_id).await?;
        self.set_read(notification_id, true).await
    }

    pub async fn mark_as_unread(&self, user_id: &str, notification_id: &str) -> Result<()> {
        self.ensure_owner(user_id, notification_id).await?;
        self.set_read(notification_id, false).await
    }

    /// 将用户所有未读通知标记为已读，返回处理的条数
    pub async fn mark_all_as_read(&self, user_id: &str) -> Result<usize> {
        let unread = self.unread_documents(user_id).await?;
        let mut updated = 0;
        for notification in &unread {
            self.set_read(&notification.id, true).await?;
            updated += 1;
        }
        info!("Marked {} notifications as read for user {}", updated, user_id);
        Ok(updated)
    }

    async fn unread_documents(&self, user_id: &str) -> Result<Vec<Notification>> {
        let query = DocumentQuery::collection(NOTIFICATIONS)
            .filter_eq("userId", user_id)
            .filter_eq("isRead", false);
        decode_all(self.store.query(&query).await?)
    }

    async fn ensure_owner(&self, user_id: &str, notification_id: &str) -> Result<Notification> {
        let notification: Option<Notification> = self
            .store
            .get(NOTIFICATIONS, notification_id)
            .await?
            .map(serde_json::from_value)
            .transpose()?;

        match notification {
            Some(n) if n.user_id == user_id => Ok(n),
            _ => Err(AppError::not_found("Notification")),
        }
    }

    async fn set_read(&self, notification_id: &str, is_read: bool) -> Result<()> {
        let patch = if is_read {
            json!({ "isRead": true, "readAt": Utc::now().to_rfc3339() })
        } else {
            json!({ "isRead": false, "readAt": null })
        };

        self.store
            .merge(NOTIFICATIONS, notification_id, patch)
            .await?
            .ok_or_else(|| AppError::not_found("Notification"))?;
        Ok(())
    }
}
