use crate::{
    error::{AppError, Result},
    models::{
        dashboard::{ActivityItem, ActivityType, DashboardData, DashboardStats},
        enrollment::{Enrollment, EnrollmentStatus},
        grade::Grade,
        notification::Notification,
    },
    services::{
        assignment::AssignmentService, course::CourseService, enrollment::EnrollmentService,
        grade::GradeService, notification::NotificationService,
    },
};
use std::collections::BTreeMap;
use tracing::{debug, error, info};

/// 活动流只取最近成绩中的前几条
const ACTIVITY_GRADE_COUNT: usize = 3;

#[derive(Clone)]
pub struct DashboardService {
    course_service: CourseService,
    enrollment_service: EnrollmentService,
    grade_service: GradeService,
    assignment_service: AssignmentService,
    notification_service: NotificationService,
    recent_limit: usize,
}

impl DashboardService {
    pub async fn new(
        course_service: CourseService,
        enrollment_service: EnrollmentService,
        grade_service: GradeService,
        assignment_service: AssignmentService,
        notification_service: NotificationService,
        recent_limit: usize,
    ) -> Result<Self> {
        Ok(Self {
            course_service,
            enrollment_service,
            grade_service,
            assignment_service,
            notification_service,
            recent_limit,
        })
    }

    /// 聚合学生仪表盘
    ///
    /// 任一步读取失败都会中止本次聚合，只返回统一的“加载失败，请刷新”错误。
    pub async fn aggregate_dashboard(&self, user_id: &str) -> Result<DashboardData> {
        match self.collect(user_id).await {
            Ok(data) => {
                info!(
                    "Aggregated dashboard for user {}: {} courses, {} grades",
                    user_id,
                    data.courses.len(),
                    data.recent_grades.len()
                );
                Ok(data)
            }
            Err(e) => {
                error!("Failed to aggregate dashboard for user {}: {}", user_id, e);
                Err(AppError::load_failed())
            }
        }
    }

    async fn collect(&self, user_id: &str) -> Result<DashboardData> {
        let enrollments = self.enrollment_service.get_user_enrollments(user_id).await?;
        let course_ids: Vec<String> = enrollments.iter().map(|e| e.course_id.clone()).collect();
        debug!("User {} has {} enrollments", user_id, enrollments.len());

        let courses = if course_ids.is_empty() {
            Vec::new()
        } else {
            self.course_service.get_courses_by_ids(&course_ids).await?
        };

        let recent_grades = self.grade_service.get_recent_grades(user_id, self.recent_limit).await?;

        let upcoming_assignments = if course_ids.is_empty() {
            Vec::new()
        } else {
            self.assignment_service
                .get_upcoming_assignments(user_id, &course_ids, self.recent_limit)
                .await?
        };

        let notifications = self
            .notification_service
            .get_user_notifications(user_id, self.recent_limit)
            .await?;

        let mut course_progress = BTreeMap::new();
        for course in &courses {
            if let Some(enrollment) = enrollments.iter().find(|e| e.course_id == course.id) {
                let progress = self.enrollment_service.course_progress(enrollment, course).await;
                course_progress.insert(course.id.clone(), progress.round() as u32);
            }
        }

        let stats = compute_stats(&enrollments, &recent_grades, upcoming_assignments.len(), &notifications);
        let activity = grade_activity(&recent_grades);

        Ok(DashboardData {
            courses,
            course_progress,
            stats,
            recent_grades,
            upcoming_assignments,
            activity,
            notifications,
        })
    }
}

pub fn compute_stats(
    enrollments: &[Enrollment],
    recent_grades: &[Grade],
    upcoming_assignments: usize,
    notifications: &[Notification],
) -> DashboardStats {
    DashboardStats {
        total_enrolled_courses: enrollments.len(),
        completed_courses: enrollments.iter().filter(|e| e.status == EnrollmentStatus::Completed).count(),
        in_progress_courses: enrollments.iter().filter(|e| e.status == EnrollmentStatus::Active).count(),
        overall_progress: overall_progress(enrollments),
        current_gpa: current_gpa(recent_grades),
        upcoming_assignments,
        unread_notifications: notifications.iter().filter(|n| !n.is_read).count(),
    }
}

/// 报名进度的算术平均，四舍五入到整数；没有报名时为 0
pub fn overall_progress(enrollments: &[Enrollment]) -> u32 {
    if enrollments.is_empty() {
        return 0;
    }
    let total: f64 = enrollments.iter().map(Enrollment::progress_percent).sum();
    (total / enrollments.len() as f64).round().clamp(0.0, 100.0) as u32
}

/// 最近成绩样本的平均绩点（不是全部历史），保留两位小数；没有成绩时为 0
pub fn current_gpa(recent_grades: &[Grade]) -> f64 {
    if recent_grades.is_empty() {
        return 0.0;
    }
    let total: f64 = recent_grades.iter().map(Grade::grade_points).sum();
    round2(total / recent_grades.len() as f64)
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// 按接收顺序取前三条成绩生成活动记录
pub fn grade_activity(recent_grades: &[Grade]) -> Vec<ActivityItem> {
    recent_grades
        .iter()
        .take(ACTIVITY_GRADE_COUNT)
        .map(|grade| ActivityItem {
            id: format!("grade-{}", grade.id),
            activity_type: ActivityType::Grade,
            title: format!("New Grade: {}", grade.title),
            description: format!("You scored {} ({})", grade.score_label(), grade.letter_grade),
            timestamp: grade.graded_at,
        })
        .collect()
}
