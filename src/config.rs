use serde::{Deserialize, Serialize};
use std::env;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    // Server configuration
    pub server_host: String,
    pub server_port: u16,
    pub environment: String,
    pub log_level: String,

    // Database configuration
    pub database_url: String,
    pub database_namespace: String,
    pub database_name: String,
    pub database_username: String,
    pub database_password: String,

    // Dashboard settings
    pub notification_poll_interval: u64,
    pub dashboard_recent_limit: usize,
    pub course_batch_limit: usize,
    /// 会话空闲多久（秒）后被回收
    pub session_idle_timeout: u64,
    /// 回收任务的执行间隔（秒）
    pub session_sweep_interval: u64,

    // CORS configuration
    pub cors_allowed_origins: String,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        Ok(Config {
            server_host: env::var("SERVER_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            server_port: env::var("SERVER_PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse()?,
            environment: env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string()),
            log_level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),

            database_url: env::var("DATABASE_URL")
                .unwrap_or_else(|_| "http://localhost:8000".to_string()),
            database_namespace: env::var("DATABASE_NAMESPACE")
                .unwrap_or_else(|_| "learnhub".to_string()),
            database_name: env::var("DATABASE_NAME")
                .unwrap_or_else(|_| "lms".to_string()),
            database_username: env::var("DATABASE_USERNAME")
                .unwrap_or_else(|_| "root".to_string()),
            database_password: env::var("DATABASE_PASSWORD")
                .unwrap_or_else(|_| "root".to_string()),

            notification_poll_interval: env::var("NOTIFICATION_POLL_INTERVAL")
                .unwrap_or_else(|_| "30".to_string())
                .parse()?,
            dashboard_recent_limit: env::var("DASHBOARD_RECENT_LIMIT")
                .unwrap_or_else(|_| "5".to_string())
                .parse()?,
            course_batch_limit: env::var("COURSE_BATCH_LIMIT")
                .unwrap_or_else(|_| "10".to_string())
                .parse()?,
            session_idle_timeout: env::var("SESSION_IDLE_TIMEOUT")
                .unwrap_or_else(|_| "1800".to_string())
                .parse()?,
            session_sweep_interval: env::var("SESSION_SWEEP_INTERVAL")
                .unwrap_or_else(|_| "60".to_string())
                .parse()?,

            cors_allowed_origins: env::var("CORS_ALLOWED_ORIGINS")
                .unwrap_or_else(|_| "http://localhost:3001".to_string()),
        })
    }

    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    pub fn is_development(&self) -> bool {
        self.environment == "development"
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_host: "127.0.0.1".to_string(),
            server_port: 3000,
            environment: "development".to_string(),
            log_level: "info".to_string(),
            database_url: "http://localhost:8000".to_string(),
            database_namespace: "learnhub".to_string(),
            database_name: "lms".to_string(),
            database_username: "root".to_string(),
            database_password: "root".to_string(),
            notification_poll_interval: 30,
            dashboard_recent_limit: 5,
            course_batch_limit: 10,
            session_idle_timeout: 1800,
            session_sweep_interval: 60,
            cors_allowed_origins: "http://localhost:3001".to_string(),
        }
    }
}
