use serde::{Deserialize, Serialize};
use validator::Validate;

pub const ALL: &str = "all";

/// 课程浏览器的筛选条件
#[derive(Debug, Clone, Serialize, Deserialize, Validate, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CourseFilter {
    #[serde(default, alias = "search", alias = "search_term")]
    #[validate(length(max = 200))]
    pub search_term: String,
    #[serde(default = "all")]
    pub category: String,
    #[serde(default = "all")]
    pub level: String,
    #[serde(default, alias = "enrolled_only")]
    pub enrolled_only: bool,
}

fn all() -> String {
    ALL.to_string()
}

impl Default for CourseFilter {
    fn default() -> Self {
        Self {
            search_term: String::new(),
            category: all(),
            level: all(),
            enrolled_only: false,
        }
    }
}

impl CourseFilter {
    pub fn search(mut self, term: &str) -> Self {
        self.search_term = term.to_string();
        self
    }

    pub fn category(mut self, category: &str) -> Self {
        self.category = category.to_string();
        self
    }

    pub fn level(mut self, level: &str) -> Self {
        self.level = level.to_string();
        self
    }

    pub fn enrolled_only(mut self, enabled: bool) -> Self {
        self.enrolled_only = enabled;
        self
    }
}

/// 提供给筛选下拉框的去重选项
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct FilterOptions {
    pub categories: Vec<String>,
    pub levels: Vec<String>,
}
