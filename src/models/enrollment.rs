use crate::utils::serde_helpers::{opt_timestamp, thing_id};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum EnrollmentStatus {
    Active,
    Completed,
    Dropped,
    /// 未知或缺失的状态
    #[default]
    #[serde(other)]
    Other,
}

impl EnrollmentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Completed => "completed",
            Self::Dropped => "dropped",
            Self::Other => "other",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Enrollment {
    #[serde(default, with = "thing_id")]
    pub id: String,
    #[serde(default)]
    pub user_id: String,
    #[serde(default)]
    pub course_id: String,
    #[serde(default)]
    pub status: EnrollmentStatus,
    /// 0-100，缺失按 0 处理
    #[serde(default)]
    pub progress: Option<f64>,
    #[serde(default, with = "opt_timestamp")]
    pub enrolled_at: Option<DateTime<Utc>>,
}

impl Enrollment {
    pub fn new_active(user_id: &str, course_id: &str) -> Self {
        Self {
            id: String::new(),
            user_id: user_id.to_string(),
            course_id: course_id.to_string(),
            status: EnrollmentStatus::Active,
            progress: Some(0.0),
            enrolled_at: Some(Utc::now()),
        }
    }

    pub fn is_active(&self) -> bool {
        self.status == EnrollmentStatus::Active
    }

    /// 存储的进度，限制在 [0, 100]
    pub fn progress_percent(&self) -> f64 {
        clamp_percent(self.progress.unwrap_or(0.0))
    }
}

pub fn clamp_percent(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 100.0)
    }
}

/// 报名操作的结果，失败信息展示在操作按钮旁
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EnrollResult {
    pub success: bool,
    pub message: String,
}

impl EnrollResult {
    pub fn ok(message: impl Into<String>) -> Self {
        Self { success: true, message: message.into() }
    }

    pub fn rejected(message: impl Into<String>) -> Self {
        Self { success: false, message: message.into() }
    }
}

/// 学生在某门课程中完成的课时
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LessonProgress {
    pub user_id: String,
    pub course_id: String,
    #[serde(default)]
    pub completed_lessons: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn unknown_status_maps_to_other() {
        let e: Enrollment = serde_json::from_value(json!({
            "id": "enrollment:e1",
            "userId": "u1",
            "courseId": "c1",
            "status": "paused"
        }))
        .unwrap();
        assert_eq!(e.status, EnrollmentStatus::Other);
        assert_eq!(e.id, "e1");
        assert_eq!(e.progress_percent(), 0.0);
    }

    #[test]
    fn missing_status_and_owner_do_not_fail_decoding() {
        let e: Enrollment = serde_json::from_value(json!({"id": "e2", "courseId": "c1", "progress": 55})).unwrap();
        assert_eq!(e.status, EnrollmentStatus::Other);
        assert!(!e.is_active());
        assert_eq!(e.user_id, "");
        assert_eq!(e.progress_percent(), 55.0);
    }

    #[test]
    fn progress_is_clamped() {
        let mut e = Enrollment::new_active("u1", "c1");
        e.progress = Some(140.0);
        assert_eq!(e.progress_percent(), 100.0);
        e.progress = Some(-5.0);
        assert_eq!(e.progress_percent(), 0.0);
        e.progress = Some(f64::NAN);
        assert_eq!(e.progress_percent(), 0.0);
    }
}
