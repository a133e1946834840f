use crate::{models::dashboard::DashboardData, services::DashboardService};
use parking_lot::RwLock;
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::debug;

/// 仪表盘视图状态，每次刷新整体重建
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardState {
    pub generation: u64,
    pub user_id: Option<String>,
    pub loading: bool,
    pub error: Option<String>,
    pub data: Option<DashboardData>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    Committed,
    Failed,
    /// 有更新的刷新已经开始，本次结果被丢弃
    Superseded,
}

/// 仪表盘视图
///
/// 每次 `refresh` 领取一个递增的代号，只有仍是最新代号的结果才会写入状态，
/// 避免慢请求覆盖较新的结果。
pub struct DashboardView {
    service: DashboardService,
    latest: AtomicU64,
    state: RwLock<DashboardState>,
}

impl DashboardView {
    pub fn new(service: DashboardService) -> Self {
        Self {
            service,
            latest: AtomicU64::new(0),
            state: RwLock::new(DashboardState::default()),
        }
    }

    pub async fn refresh(&self, user_id: &str) -> RefreshOutcome {
        let generation = self.latest.fetch_add(1, Ordering::SeqCst) + 1;
        {
            let mut state = self.state.write();
            state.loading = true;
            state.user_id = Some(user_id.to_string());
        }

        let result = self.service.aggregate_dashboard(user_id).await;

        let mut state = self.state.write();
        if self.latest.load(Ordering::SeqCst) != generation {
            debug!("Discarding dashboard run {} for user {}", generation, user_id);
            return RefreshOutcome::Superseded;
        }

        state.generation = generation;
        state.loading = false;
        match result {
            Ok(data) => {
                state.data = Some(data);
                state.error = None;
                RefreshOutcome::Committed
            }
            Err(e) => {
                state.data = None;
                state.error = Some(e.to_string());
                RefreshOutcome::Failed
            }
        }
    }

    pub fn snapshot(&self) -> DashboardState {
        self.state.read().clone()
    }
}
