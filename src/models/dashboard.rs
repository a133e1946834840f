use super::{assignment::Assignment, course::Course, grade::Grade, notification::Notification};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// 每次聚合重新计算的统计数据，不做跨次缓存
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub total_enrolled_courses: usize,
    pub completed_courses: usize,
    pub in_progress_courses: usize,
    /// 0-100
    pub overall_progress: u32,
    /// 0-4，保留两位小数，仅基于最近成绩样本
    #[serde(rename = "currentGPA")]
    pub current_gpa: f64,
    pub upcoming_assignments: usize,
    pub unread_notifications: usize,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ActivityType {
    Grade,
    Assignment,
    Course,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ActivityItem {
    pub id: String,
    #[serde(rename = "type")]
    pub activity_type: ActivityType,
    pub title: String,
    pub description: String,
    pub timestamp: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardData {
    pub courses: Vec<Course>,
    /// 课程 ID -> 进度百分比
    pub course_progress: BTreeMap<String, u32>,
    pub stats: DashboardStats,
    pub recent_grades: Vec<Grade>,
    pub upcoming_assignments: Vec<Assignment>,
    pub activity: Vec<ActivityItem>,
    pub notifications: Vec<Notification>,
}
