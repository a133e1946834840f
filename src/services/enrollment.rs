use crate::{
    error::Result,
    models::{
        course::Course,
        enrollment::{clamp_percent, EnrollResult, Enrollment, EnrollmentStatus, LessonProgress},
    },
    services::{
        course::CourseService,
        store::{decode_all, DocumentQuery, SharedStore},
    },
};
use std::collections::HashSet;
use tracing::{debug, info, warn};

pub const ENROLLMENTS: &str = "enrollments";
pub const LESSON_PROGRESS: &str = "lesson_progress";

#[derive(Clone)]
pub struct EnrollmentService {
    store: SharedStore,
    course_service: CourseService,
}

impl EnrollmentService {
    pub async fn new(store: SharedStore, course_service: CourseService) -> Result<Self> {
        Ok(Self { store, course_service })
    }

    /// 用户的全部报名记录（不区分状态）
    pub async fn get_user_enrollments(&self, user_id: &str) -> Result<Vec<Enrollment>> {
        debug!("Fetching enrollments for user: {}", user_id);
        let query = DocumentQuery::collection(ENROLLMENTS).filter_eq("userId", user_id);
        decode_all(self.store.query(&query).await?)
    }

    /// 处于 active 状态的课程 ID 集合
    pub async fn get_active_course_ids(&self, user_id: &str) -> Result<HashSet<String>> {
        Ok(self
            .get_user_enrollments(user_id)
            .await?
            .into_iter()
            .filter(Enrollment::is_active)
            .map(|e| e.course_id)
            .collect())
    }

    /// 报名课程
    ///
    /// 课程不存在/未发布或已有 active 报名时返回 `success = false`；存储出错时返回 Err。
    pub async fn enroll_student(&self, user_id: &str, course_id: &str) -> Result<EnrollResult> {
        debug!("Enrolling user {} in course {}", user_id, course_id);

        let course = match self.course_service.get_course(course_id).await {
            Ok(course) => course,
            Err(crate::error::AppError::NotFound(_)) => {
                return Ok(EnrollResult::rejected("Course is not available for enrollment"));
            }
            Err(e) => return Err(e),
        };

        let existing = DocumentQuery::collection(ENROLLMENTS)
            .filter_eq("userId", user_id)
            .filter_eq("courseId", course_id)
            .filter_eq("status", EnrollmentStatus::Active.as_str())
            .limit(1);
        if !self.store.query(&existing).await?.is_empty() {
            return Ok(EnrollResult::rejected("You are already enrolled in this course"));
        }

        let enrollment = Enrollment::new_active(user_id, course_id);
        self.store
            .create(ENROLLMENTS, serde_json::to_value(&enrollment)?)
            .await?;
        self.course_service.increment_students(course_id).await?;

        info!("User {} enrolled in course {}", user_id, course_id);
        Ok(EnrollResult::ok(format!("Successfully enrolled in {}", course.title)))
    }

    /// 课程进度：已完成课时 / 总课时
    ///
    /// 没有进度记录、课程没有课时或者读取失败时，退回报名记录里保存的进度。
    pub async fn course_progress(&self, enrollment: &Enrollment, course: &Course) -> f64 {
        let stored = enrollment.progress_percent();
        let total = course.total_lessons();
        if total == 0 {
            return stored;
        }

        let query = DocumentQuery::collection(LESSON_PROGRESS)
            .filter_eq("userId", enrollment.user_id.as_str())
            .filter_eq("courseId", course.id.as_str())
            .limit(1);

        let record = match self.store.query(&query).await.and_then(decode_all::<LessonProgress>) {
            Ok(records) => records.into_iter().next(),
            Err(e) => {
                warn!(
                    "Failed to fetch progress for course {} (user {}), using stored value: {}",
                    course.id, enrollment.user_id, e
                );
                return stored;
            }
        };

        match record {
            Some(progress) => {
                let lesson_ids: HashSet<&str> = course
                    .modules
                    .iter()
                    .flat_map(|m| m.lessons.iter().map(|l| l.id.as_str()))
                    .collect();
                let completed = progress
                    .completed_lessons
                    .iter()
                    .filter(|id| lesson_ids.contains(id.as_str()))
                    .collect::<HashSet<_>>()
                    .len();
                clamp_percent(completed as f64 / total as f64 * 100.0)
            }
            None => stored,
        }
    }
}
