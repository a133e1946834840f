use crate::{
    error::{AppError, Result},
    models::{
        course::{Course, CourseDocument, CourseStatus},
        filter::FilterOptions,
    },
    services::store::{DocumentQuery, SharedStore, SortDirection, IN_QUERY_LIMIT},
    utils::{filter, serde_helpers::lenient_count},
};
use serde_json::Value;
use tracing::{debug, info, warn};

pub const COURSES: &str = "courses";

#[derive(Clone)]
pub struct CourseService {
    store: SharedStore,
    batch_limit: usize,
}

impl CourseService {
    pub async fn new(store: SharedStore, batch_limit: usize) -> Result<Self> {
        Ok(Self {
            store,
            batch_limit: batch_limit.clamp(1, IN_QUERY_LIMIT),
        })
    }

    /// 获取已发布课程，按创建时间倒序
    ///
    /// 依次尝试：带排序的过滤查询（需要复合索引）、不排序的过滤查询、全表查询。
    /// 无论哪一层成功，都会在本地重新过滤非 Published 的记录并排序。
    pub async fn resolve_published_courses(&self) -> Result<Vec<Course>> {
        let documents = self.fetch_with_fallback().await?;
        let courses = normalize_published(documents);
        info!("Resolved {} published courses", courses.len());
        Ok(courses)
    }

    async fn fetch_with_fallback(&self) -> Result<Vec<Value>> {
        let published = || DocumentQuery::collection(COURSES).filter_eq("status", CourseStatus::PUBLISHED);
        let tiers = [
            ("ordered", published().order_by("createdAt", SortDirection::Desc)),
            ("filtered", published()),
            ("full scan", DocumentQuery::collection(COURSES)),
        ];

        let mut last_error = None;
        for (tier, query) in tiers.iter() {
            match self.store.query(query).await {
                Ok(documents) => {
                    debug!("Course query tier '{}' returned {} documents", tier, documents.len());
                    return Ok(documents);
                }
                Err(e) => {
                    warn!("Course query tier '{}' failed: {}", tier, e);
                    last_error = Some(e);
                }
            }
        }

        Err(AppError::LoadFailed(format!(
            "Failed to load courses. Please refresh the page. ({})",
            last_error.map(|e| e.to_string()).unwrap_or_default()
        )))
    }

    /// 课程详情（模块、课时、内容块），学生只能看到已发布课程
    pub async fn get_course(&self, course_id: &str) -> Result<Course> {
        debug!("Fetching course: {}", course_id);

        let document = self
            .store
            .get(COURSES, course_id)
            .await?
            .ok_or_else(|| AppError::not_found("Course"))?;
        let document: CourseDocument = serde_json::from_value(document)?;

        if !document.is_published() {
            return Err(AppError::not_found("Course"));
        }
        Ok(Course::from(document))
    }

    /// 按 ID 批量获取课程；只请求前 `batch_limit` 个 ID，其余的直接丢弃不分页
    pub async fn get_courses_by_ids(&self, course_ids: &[String]) -> Result<Vec<Course>> {
        if course_ids.is_empty() {
            return Ok(Vec::new());
        }

        if course_ids.len() > self.batch_limit {
            debug!(
                "Course lookup capped at {} of {} ids",
                self.batch_limit,
                course_ids.len()
            );
        }
        let batch: Vec<&str> = course_ids.iter().take(self.batch_limit).map(String::as_str).collect();

        let query = DocumentQuery::collection(COURSES).filter_in("id", batch);
        let documents = self.store.query(&query).await?;
        Ok(normalize_published(documents))
    }

    /// 从完整课程列表得到分类与难度选项
    pub fn filter_options(&self, courses: &[Course]) -> FilterOptions {
        filter::filter_options(courses)
    }

    /// 报名成功后课程人数加一
    pub async fn increment_students(&self, course_id: &str) -> Result<u32> {
        let document = self
            .store
            .get(COURSES, course_id)
            .await?
            .ok_or_else(|| AppError::not_found("Course"))?;
        let current = document
            .get("students")
            .and_then(lenient_count::parse)
            .unwrap_or(0)
            .clamp(0, u32::MAX as i64) as u32;
        let next = current.saturating_add(1);

        self.store
            .merge(COURSES, course_id, serde_json::json!({ "students": next }))
            .await?;
        Ok(next)
    }
}

/// 本地再过滤一遍 Published，补全默认值，并按 createdAt 倒序稳定排序
pub fn normalize_published(documents: Vec<Value>) -> Vec<Course> {
    let mut courses: Vec<Course> = documents
        .into_iter()
        .filter_map(|doc| match serde_json::from_value::<CourseDocument>(doc) {
            Ok(doc) => Some(doc),
            Err(e) => {
                warn!("Skipping malformed course document: {}", e);
                None
            }
        })
        .filter(CourseDocument::is_published)
        .map(Course::from)
        .collect();

    sort_by_created_desc(&mut courses);
    courses
}

/// 有时间戳的课程之间按倒序排列；缺少时间戳的课程留在原位置
pub fn sort_by_created_desc(courses: &mut [Course]) {
    let slots: Vec<usize> = courses
        .iter()
        .enumerate()
        .filter(|(_, c)| c.created_at.is_some())
        .map(|(i, _)| i)
        .collect();

    let mut dated: Vec<Course> = slots.iter().map(|&i| courses[i].clone()).collect();
    dated.sort_by(|a, b| b.created_at.cmp(&a.created_at));

    for (slot, course) in slots.into_iter().zip(dated) {
        courses[slot] = course;
    }
}
