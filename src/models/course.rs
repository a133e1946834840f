use crate::utils::serde_helpers::{lenient_count, opt_timestamp, thing_id};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::warn;

/// 课程难度
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub enum CourseLevel {
    #[default]
    Beginner,
    Intermediate,
    Advanced,
}

impl CourseLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Beginner => "Beginner",
            Self::Intermediate => "Intermediate",
            Self::Advanced => "Advanced",
        }
    }

    /// 未知或缺失的难度一律视为 Beginner
    pub fn parse_or_default(raw: Option<&str>) -> Self {
        match raw {
            Some("Intermediate") => Self::Intermediate,
            Some("Advanced") => Self::Advanced,
            _ => Self::Beginner,
        }
    }
}

impl fmt::Display for CourseLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 课程发布状态，只有 Published 的课程对学生可见
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum CourseStatus {
    Published,
    #[default]
    Draft,
    #[serde(rename = "Under Review")]
    UnderReview,
}

impl CourseStatus {
    pub const PUBLISHED: &'static str = "Published";

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Published => "Published",
            Self::Draft => "Draft",
            Self::UnderReview => "Under Review",
        }
    }

    pub fn parse_or_default(raw: Option<&str>) -> Self {
        match raw {
            Some("Published") => Self::Published,
            Some("Under Review") => Self::UnderReview,
            _ => Self::Draft,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Course {
    pub id: String,
    pub title: String,
    pub description: String,
    pub category: String,
    pub level: CourseLevel,
    pub status: CourseStatus,
    pub students: u32,
    pub instructor: String,
    pub duration: String,
    pub thumbnail: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub modules: Vec<CourseModule>,
}

impl Course {
    pub fn is_published(&self) -> bool {
        self.status == CourseStatus::Published
    }

    pub fn total_lessons(&self) -> usize {
        self.modules.iter().map(|m| m.lessons.len()).sum()
    }

    pub fn find_module(&self, module_id: &str) -> Option<&CourseModule> {
        self.modules.iter().find(|m| m.id == module_id)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CourseModule {
    pub id: String,
    pub title: String,
    pub lessons: Vec<Lesson>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub test: Option<Vec<QuizQuestion>>,
}

impl CourseModule {
    pub fn find_lesson(&self, lesson_id: &str) -> Option<&Lesson> {
        self.lessons.iter().find(|l| l.id == lesson_id)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Lesson {
    pub id: String,
    pub title: String,
    pub content_blocks: Vec<ContentBlock>,
}

/// 课时内容块，`type` 字段决定携带哪一种负载
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ContentBlock {
    Text {
        id: String,
        content: String,
    },
    Image {
        id: String,
        url: String,
    },
    Video {
        id: String,
        url: String,
    },
    Quiz {
        id: String,
        #[serde(rename = "quizData")]
        quiz_data: Vec<QuizQuestion>,
    },
}

impl ContentBlock {
    pub fn id(&self) -> &str {
        match self {
            Self::Text { id, .. } | Self::Image { id, .. } | Self::Video { id, .. } | Self::Quiz { id, .. } => id,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::Text { .. } => "text",
            Self::Image { .. } => "image",
            Self::Video { .. } => "video",
            Self::Quiz { .. } => "quiz",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct QuizQuestion {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub question: String,
    #[serde(default)]
    pub options: Vec<QuizOption>,
}

impl QuizQuestion {
    /// 约定只有一个正确选项，但并不强制；取第一个标记为正确的
    pub fn correct_option(&self) -> Option<&QuizOption> {
        self.options.iter().find(|o| o.is_correct)
    }

    pub fn is_correct_answer(&self, option_id: &str) -> bool {
        self.options
            .iter()
            .any(|o| o.id == option_id && o.is_correct)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct QuizOption {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub is_correct: bool,
}

/// 存储中的原始课程文档，所有字段都可能缺失
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseDocument {
    #[serde(with = "thing_id")]
    pub id: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub level: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default, with = "lenient_count")]
    pub students: Option<i64>,
    #[serde(default)]
    pub instructor: Option<String>,
    #[serde(default)]
    pub duration: Option<String>,
    #[serde(default)]
    pub thumbnail: Option<String>,
    #[serde(default, with = "opt_timestamp")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub modules: Vec<ModuleDocument>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModuleDocument {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub lessons: Vec<LessonDocument>,
    #[serde(default)]
    pub test: Option<Vec<QuizQuestion>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LessonDocument {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub content_blocks: Vec<serde_json::Value>,
}

impl CourseDocument {
    pub fn is_published(&self) -> bool {
        self.status.as_deref() == Some(CourseStatus::PUBLISHED)
    }
}

impl From<CourseDocument> for Course {
    fn from(doc: CourseDocument) -> Self {
        let course_id = doc.id;
        let modules = doc
            .modules
            .into_iter()
            .enumerate()
            .map(|(index, module)| module.normalize(&course_id, index))
            .collect();

        Course {
            title: doc.title.unwrap_or_else(|| "Untitled Course".to_string()),
            description: doc.description.unwrap_or_default(),
            category: doc.category.unwrap_or_else(|| "General".to_string()),
            level: CourseLevel::parse_or_default(doc.level.as_deref()),
            status: CourseStatus::parse_or_default(doc.status.as_deref()),
            students: doc.students.unwrap_or(0).clamp(0, u32::MAX as i64) as u32,
            instructor: doc.instructor.unwrap_or_else(|| "Unknown Instructor".to_string()),
            duration: doc.duration.unwrap_or_default(),
            thumbnail: doc.thumbnail,
            created_at: doc.created_at,
            modules,
            id: course_id,
        }
    }
}

impl ModuleDocument {
    fn normalize(self, course_id: &str, index: usize) -> CourseModule {
        let module_id = self.id.unwrap_or_else(|| format!("module-{}", index + 1));
        let lessons = self
            .lessons
            .into_iter()
            .enumerate()
            .map(|(i, lesson)| lesson.normalize(course_id, i))
            .collect();

        CourseModule {
            title: self.title.unwrap_or_else(|| format!("Module {}", index + 1)),
            lessons,
            test: self.test,
            id: module_id,
        }
    }
}

impl LessonDocument {
    fn normalize(self, course_id: &str, index: usize) -> Lesson {
        let lesson_id = self.id.unwrap_or_else(|| format!("lesson-{}", index + 1));
        let content_blocks = self
            .content_blocks
            .into_iter()
            .filter_map(|raw| match serde_json::from_value::<ContentBlock>(raw) {
                Ok(block) => Some(block),
                Err(e) => {
                    warn!("Skipping malformed content block in course {} lesson {}: {}", course_id, lesson_id, e);
                    None
                }
            })
            .collect();

        Lesson {
            title: self.title.unwrap_or_else(|| format!("Lesson {}", index + 1)),
            content_blocks,
            id: lesson_id,
        }
    }
}
