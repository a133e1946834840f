use std::sync::Arc;
use std::time::Duration;
use tokio::time::interval;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use learnhub_dashboard::{
    config::Config,
    routes,
    services::{Database, MemoryStore, SharedStore},
    state::AppState,
};

/// DATABASE_URL 取这个值时使用内存文档库
const MEMORY_STORE_URL: &str = "memory";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 加载配置
    dotenv::dotenv().ok();

    // 初始化日志
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("LOG_LEVEL").unwrap_or_else(|_| "learnhub_dashboard=debug,tower_http=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting LearnHub dashboard service...");

    let config = Config::from_env()?;

    // 初始化文档库
    let store: SharedStore = if config.database_url == MEMORY_STORE_URL {
        warn!("Using in-memory document store; data is lost on restart");
        Arc::new(MemoryStore::new())
    } else {
        let db = match Database::new(&config).await {
            Ok(db) => db,
            Err(e) => {
                error!("Failed to create database connection: {}", e);
                return Err(anyhow::anyhow!("Database initialization failed"));
            }
        };
        db.verify_connection().await?;
        info!("Database connection established successfully");
        Arc::new(db)
    };

    // 创建应用状态
    let app_state = Arc::new(AppState::new(config.clone(), store).await?);

    // 启动后台任务
    start_background_tasks(app_state.clone()).await;

    let app = routes::app(app_state);

    // 启动主服务器
    let addr = format!("{}:{}", config.server_host, config.server_port);
    info!("Starting server on http://{}", addr);

    axum::Server::bind(&addr.parse()?)
        .serve(app.into_make_service())
        .await?;

    Ok(())
}

/// 启动后台任务
async fn start_background_tasks(app_state: Arc<AppState>) {
    info!("Starting background tasks...");

    // 空闲会话回收任务
    let session_state = app_state.clone();
    tokio::spawn(async move {
        let idle_timeout = Duration::from_secs(session_state.config.session_idle_timeout);
        let mut interval = interval(Duration::from_secs(session_state.config.session_sweep_interval.max(1)));

        loop {
            interval.tick().await;
            let evicted = session_state.evict_idle(idle_timeout);
            if evicted > 0 {
                info!(
                    "Evicted {} idle view sessions, {} remaining",
                    evicted,
                    session_state.session_count()
                );
            }
        }
    });

    info!("Background tasks started successfully");
}
