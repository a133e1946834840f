use crate::{
    config::Config,
    error::Result,
    services::{
        AssignmentService, CourseService, DashboardService, EnrollmentService, GradeService,
        NotificationService, SharedStore,
    },
    views::{DashboardView, NotificationBell, Shell},
};
use dashmap::DashMap;
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info};

/// 单个学生的视图状态，只由创建它的会话持有
pub struct UserSession {
    pub dashboard: DashboardView,
    pub shell: Mutex<Shell>,
    last_seen: Mutex<Instant>,
}

impl UserSession {
    fn touch(&self) {
        *self.last_seen.lock() = Instant::now();
    }

    pub fn idle_for(&self) -> Duration {
        Instant::now().saturating_duration_since(*self.last_seen.lock())
    }
}

/// 应用程序的共享状态
/// 包含所有服务和配置的引用
pub struct AppState {
    /// 应用配置
    pub config: Config,

    /// 文档库
    pub store: SharedStore,

    /// 课程服务
    pub course_service: CourseService,

    /// 报名服务
    pub enrollment_service: EnrollmentService,

    /// 成绩服务
    pub grade_service: GradeService,

    /// 作业服务
    pub assignment_service: AssignmentService,

    /// 通知服务
    pub notification_service: NotificationService,

    /// 仪表盘聚合服务
    pub dashboard_service: DashboardService,

    /// 按用户 ID 保存的视图会话
    sessions: DashMap<String, Arc<UserSession>>,
}

impl AppState {
    pub async fn new(config: Config, store: SharedStore) -> Result<Self> {
        let course_service = CourseService::new(store.clone(), config.course_batch_limit).await?;
        let enrollment_service = EnrollmentService::new(store.clone(), course_service.clone()).await?;
        let grade_service = GradeService::new(store.clone()).await?;
        let assignment_service = AssignmentService::new(store.clone()).await?;
        let notification_service = NotificationService::new(store.clone()).await?;
        let dashboard_service = DashboardService::new(
            course_service.clone(),
            enrollment_service.clone(),
            grade_service.clone(),
            assignment_service.clone(),
            notification_service.clone(),
            config.dashboard_recent_limit,
        )
        .await?;

        Ok(Self {
            config,
            store,
            course_service,
            enrollment_service,
            grade_service,
            assignment_service,
            notification_service,
            dashboard_service,
            sessions: DashMap::new(),
        })
    }

    /// 获取或创建用户会话；新会话会启动通知轮询
    pub fn session(&self, user_id: &str) -> Arc<UserSession> {
        let session = self
            .sessions
            .entry(user_id.to_string())
            .or_insert_with(|| {
                info!("Opening view session for user {}", user_id);
                let bell = NotificationBell::start(
                    self.notification_service.clone(),
                    user_id,
                    Duration::from_secs(self.config.notification_poll_interval.max(1)),
                );
                Arc::new(UserSession {
                    dashboard: DashboardView::new(self.dashboard_service.clone()),
                    shell: Mutex::new(Shell::new(bell)),
                    last_seen: Mutex::new(Instant::now()),
                })
            })
            .clone();
        session.touch();
        session
    }

    pub fn existing_session(&self, user_id: &str) -> Option<Arc<UserSession>> {
        let session = self.sessions.get(user_id).map(|s| s.clone())?;
        session.touch();
        Some(session)
    }

    /// 关闭会话，停止通知轮询
    pub fn end_session(&self, user_id: &str) -> bool {
        match self.sessions.remove(user_id) {
            Some((_, session)) => {
                session.shell.lock().bell().stop();
                info!("Closed view session for user {}", user_id);
                true
            }
            None => false,
        }
    }

    /// 回收空闲超过 `max_idle` 的会话，返回回收数量
    pub fn evict_idle(&self, max_idle: Duration) -> usize {
        let idle: Vec<String> = self
            .sessions
            .iter()
            .filter(|entry| entry.value().idle_for() >= max_idle)
            .map(|entry| entry.key().clone())
            .collect();

        let mut evicted = 0;
        for user_id in idle {
            // 检查与删除之间会话可能又被访问
            if let Some((_, session)) = self.sessions.remove_if(&user_id, |_, s| s.idle_for() >= max_idle) {
                session.shell.lock().bell().stop();
                debug!("Evicted idle view session for user {}", user_id);
                evicted += 1;
            }
        }
        evicted
    }

    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }

    /// 检查是否为生产环境
    pub fn is_production(&self) -> bool {
        self.config.is_production()
    }
}
