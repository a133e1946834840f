use crate::services::NotificationService;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// 顶部通知铃铛：未读数徽标和下拉面板
///
/// 创建时启动定时刷新任务，铃铛被丢弃时任务随之取消。
pub struct NotificationBell {
    unread: Arc<AtomicUsize>,
    open: bool,
    cancel: CancellationToken,
}

impl NotificationBell {
    pub fn start(service: NotificationService, user_id: impl Into<String>, every: Duration) -> Self {
        let unread = Arc::new(AtomicUsize::new(0));
        let cancel = CancellationToken::new();
        let user_id = user_id.into();

        let counter = unread.clone();
        let token = cancel.clone();
        tokio::spawn(async move {
            let mut ticker = interval(every);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    _ = token.cancelled() => {
                        debug!("Stopping notification polling for user {}", user_id);
                        break;
                    }
                    _ = ticker.tick() => {
                        // 不等待上一次刷新完成
                        tokio::spawn(refresh_count(service.clone(), user_id.clone(), counter.clone()));
                    }
                }
            }
        });

        Self { unread, open: false, cancel }
    }

    pub fn unread_count(&self) -> usize {
        self.unread.load(Ordering::SeqCst)
    }

    /// 本地标记已读后立即调整徽标，下一次轮询会再校正
    pub fn decrement(&self) {
        let _ = self
            .unread
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| Some(n.saturating_sub(1)));
    }

    pub fn clear(&self) {
        self.unread.store(0, Ordering::SeqCst);
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn toggle(&mut self) -> bool {
        self.open = !self.open;
        self.open
    }

    /// 面板外点击：只在面板打开时生效，返回是否关闭了面板
    pub fn dismiss_outside(&mut self) -> bool {
        if self.open {
            self.open = false;
            true
        } else {
            false
        }
    }

    pub fn is_polling(&self) -> bool {
        !self.cancel.is_cancelled()
    }

    pub fn stop(&self) {
        self.cancel.cancel();
    }
}

impl Drop for NotificationBell {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

async fn refresh_count(service: NotificationService, user_id: String, counter: Arc<AtomicUsize>) {
    match service.get_unread_count(&user_id).await {
        Ok(count) => counter.store(count, Ordering::SeqCst),
        Err(e) => warn!("Failed to refresh unread count for user {}: {}", user_id, e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::{notification::NOTIFICATIONS, MemoryStore};
    use serde_json::json;

    async fn settle() {
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }
    }

    fn unread(id: &str) -> serde_json::Value {
        json!({"id": id, "userId": "u1", "title": id, "isRead": false})
    }

    #[tokio::test(start_paused = true)]
    async fn polls_on_interval_until_dropped() {
        let store = Arc::new(MemoryStore::new());
        store.insert(NOTIFICATIONS, unread("n1"));
        let service = NotificationService::new(store.clone()).await.unwrap();

        let bell = NotificationBell::start(service, "u1", Duration::from_secs(30));
        settle().await;
        assert_eq!(bell.unread_count(), 1);

        store.insert(NOTIFICATIONS, unread("n2"));
        tokio::time::advance(Duration::from_secs(10)).await;
        settle().await;
        assert_eq!(bell.unread_count(), 1);

        tokio::time::advance(Duration::from_secs(20)).await;
        settle().await;
        assert_eq!(bell.unread_count(), 2);

        let counter = bell.unread.clone();
        drop(bell);
        settle().await;

        store.insert(NOTIFICATIONS, unread("n3"));
        tokio::time::advance(Duration::from_secs(60)).await;
        settle().await;
        assert_eq!(counter.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn failed_poll_keeps_last_count() {
        let store = Arc::new(MemoryStore::new());
        store.insert(NOTIFICATIONS, unread("n1"));
        let service = NotificationService::new(store.clone()).await.unwrap();

        let bell = NotificationBell::start(service, "u1", Duration::from_secs(30));
        settle().await;
        store.fail_collection(NOTIFICATIONS);
        tokio::time::advance(Duration::from_secs(30)).await;
        settle().await;
        assert_eq!(bell.unread_count(), 1);
    }

    #[tokio::test]
    async fn dropdown_toggles_and_dismisses() {
        let service = NotificationService::new(Arc::new(MemoryStore::new())).await.unwrap();
        let mut bell = NotificationBell::start(service, "u1", Duration::from_secs(30));

        assert!(!bell.dismiss_outside());
        assert!(bell.toggle());
        assert!(bell.dismiss_outside());
        assert!(!bell.is_open());

        bell.decrement();
        assert_eq!(bell.unread_count(), 0);

        assert!(bell.is_polling());
        bell.stop();
        assert!(!bell.is_polling());
    }
}
