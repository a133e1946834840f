use crate::{
    models::{
        course::{Course, CourseModule, Lesson},
        enrollment::EnrollResult,
        filter::{CourseFilter, FilterOptions},
    },
    services::{CourseService, EnrollmentService},
    utils::filter::{filter_courses, filter_options},
};
use futures::future::join_all;
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use tracing::{error, warn};

pub const ENROLL_FAILED_MESSAGE: &str = "Failed to enroll in course. Please try again.";

/// 当前在课程查看器中打开的位置
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Selection {
    pub course_id: Option<String>,
    pub module_id: Option<String>,
    pub lesson_id: Option<String>,
}

/// 课程浏览器视图状态
#[derive(Debug, Clone, Default)]
pub struct CourseBrowserView {
    courses: Vec<Course>,
    active_enrollments: HashSet<String>,
    progress: HashMap<String, u32>,
    filter: CourseFilter,
    selection: Selection,
    load_error: Option<String>,
    action_error: Option<String>,
    action_message: Option<String>,
}

impl CourseBrowserView {
    /// 加载课程目录、报名状态和每门课程的进度
    pub async fn load(courses: &CourseService, enrollments: &EnrollmentService, user_id: &str) -> Self {
        let mut view = Self::default();

        let catalog = match courses.resolve_published_courses().await {
            Ok(catalog) => catalog,
            Err(e) => {
                error!("Failed to load course catalog: {}", e);
                view.load_error = Some(e.to_string());
                return view;
            }
        };

        let user_enrollments = match enrollments.get_user_enrollments(user_id).await {
            Ok(list) => list,
            Err(e) => {
                warn!("Failed to load enrollments for user {}: {}", user_id, e);
                view.courses = catalog;
                view.load_error = Some("Failed to load your enrollments. Please refresh the page.".to_string());
                return view;
            }
        };

        let active: Vec<_> = user_enrollments.iter().filter(|e| e.is_active()).collect();
        view.active_enrollments = active.iter().map(|e| e.course_id.clone()).collect();

        let progress = join_all(active.iter().filter_map(|enrollment| {
            let course = catalog.iter().find(|c| c.id == enrollment.course_id)?;
            Some(async move { (course.id.clone(), enrollments.course_progress(enrollment, course).await) })
        }))
        .await;
        view.progress = progress
            .into_iter()
            .map(|(course_id, percent)| (course_id, percent.round() as u32))
            .collect();

        view.courses = catalog;
        view
    }

    pub fn courses(&self) -> &[Course] {
        &self.courses
    }

    pub fn visible_courses(&self) -> Vec<&Course> {
        filter_courses(&self.courses, &self.filter, &self.active_enrollments)
    }

    pub fn filter_options(&self) -> FilterOptions {
        filter_options(&self.courses)
    }

    pub fn set_filter(&mut self, filter: CourseFilter) {
        self.filter = filter;
    }

    pub fn filter(&self) -> &CourseFilter {
        &self.filter
    }

    pub fn is_enrolled(&self, course_id: &str) -> bool {
        self.active_enrollments.contains(course_id)
    }

    pub fn progress_for(&self, course_id: &str) -> Option<u32> {
        self.progress.get(course_id).copied()
    }

    pub fn load_error(&self) -> Option<&str> {
        self.load_error.as_deref()
    }

    pub fn action_error(&self) -> Option<&str> {
        self.action_error.as_deref()
    }

    pub fn action_message(&self) -> Option<&str> {
        self.action_message.as_deref()
    }

    /// 报名；成功后立即在本地把课程人数加一，不等待下一次完整刷新
    pub async fn enroll(&mut self, enrollments: &EnrollmentService, user_id: &str, course_id: &str) -> EnrollResult {
        self.action_error = None;
        self.action_message = None;

        let result = match enrollments.enroll_student(user_id, course_id).await {
            Ok(result) => result,
            Err(e) => {
                error!("Enrollment of user {} in course {} failed: {}", user_id, course_id, e);
                EnrollResult::rejected(ENROLL_FAILED_MESSAGE)
            }
        };

        if result.success {
            self.active_enrollments.insert(course_id.to_string());
            self.progress.entry(course_id.to_string()).or_insert(0);
            if let Some(course) = self.courses.iter_mut().find(|c| c.id == course_id) {
                course.students = course.students.saturating_add(1);
            }
            self.action_message = Some(result.message.clone());
        } else {
            self.action_error = Some(result.message.clone());
        }
        result
    }

    /// 打开课程，默认定位到第一个模块的第一个课时
    pub fn open_course(&mut self, course_id: &str) -> Option<&Course> {
        let course = self.courses.iter().find(|c| c.id == course_id)?;
        let first_module = course.modules.first();
        self.selection = Selection {
            course_id: Some(course.id.clone()),
            module_id: first_module.map(|m| m.id.clone()),
            lesson_id: first_module.and_then(|m| m.lessons.first()).map(|l| l.id.clone()),
        };
        Some(course)
    }

    pub fn select_lesson(&mut self, module_id: &str, lesson_id: &str) -> Option<&Lesson> {
        let course_id = self.selection.course_id.clone()?;
        let found = self
            .courses
            .iter()
            .find(|c| c.id == course_id)
            .and_then(|c| c.find_module(module_id))
            .and_then(|m| m.find_lesson(lesson_id))
            .is_some();
        if !found {
            return None;
        }

        self.selection.module_id = Some(module_id.to_string());
        self.selection.lesson_id = Some(lesson_id.to_string());
        self.current_lesson()
    }

    pub fn close_course(&mut self) {
        self.selection = Selection::default();
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn current_course(&self) -> Option<&Course> {
        let id = self.selection.course_id.as_deref()?;
        self.courses.iter().find(|c| c.id == id)
    }

    pub fn current_module(&self) -> Option<&CourseModule> {
        let id = self.selection.module_id.as_deref()?;
        self.current_course()?.find_module(id)
    }

    pub fn current_lesson(&self) -> Option<&Lesson> {
        let id = self.selection.lesson_id.as_deref()?;
        self.current_module()?.find_lesson(id)
    }
}
