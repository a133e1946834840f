use crate::utils::serde_helpers::{opt_timestamp, thing_id};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Grade {
    #[serde(with = "thing_id")]
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(rename = "type", default)]
    pub grade_type: String,
    #[serde(default)]
    pub points: f64,
    #[serde(default)]
    pub max_points: f64,
    #[serde(default)]
    pub letter_grade: String,
    #[serde(default, with = "opt_timestamp")]
    pub graded_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub course_id: Option<String>,
}

impl Grade {
    /// 4 分制绩点；满分为 0 的成绩计 0，超额得分截断到 4
    pub fn grade_points(&self) -> f64 {
        if self.max_points <= 0.0 || !self.points.is_finite() {
            return 0.0;
        }
        (self.points / self.max_points * 4.0).clamp(0.0, 4.0)
    }

    pub fn score_label(&self) -> String {
        format!("{}/{}", trim_float(self.points), trim_float(self.max_points))
    }
}

fn trim_float(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{}", value as i64)
    } else {
        format!("{:.1}", value)
    }
}
