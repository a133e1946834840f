use crate::utils::serde_helpers::{opt_timestamp, thing_id};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Assignment {
    #[serde(with = "thing_id")]
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(rename = "type", default)]
    pub assignment_type: String,
    #[serde(default)]
    pub max_points: f64,
    #[serde(default, with = "opt_timestamp")]
    pub due_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub course_id: String,
}
