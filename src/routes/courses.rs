use crate::{
    error::{AppError, Result},
    models::{
        course::{Course, CourseModule, Lesson},
        enrollment::EnrollResult,
        filter::{CourseFilter, FilterOptions},
        response::ApiResponse,
    },
    state::AppState,
    utils::identity::CurrentUser,
    views::{course_browser::Selection, CourseBrowserView},
};
use axum::{
    extract::{Path, Query, State},
    routing::{get, post},
    Router,
};
use serde::Serialize;
use std::sync::Arc;
use tracing::debug;
use validator::Validate;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(list_courses))
        .route("/filters", get(get_filter_options))
        .route("/:id", get(get_course))
        .route("/:id/modules/:module_id/lessons/:lesson_id", get(get_lesson))
        .route("/:id/enroll", post(enroll))
}

/// 课程卡片：课程本身加上当前学生的报名状态
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseCard<'a> {
    #[serde(flatten)]
    pub course: &'a Course,
    pub is_enrolled: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub progress: Option<u32>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseList<'a> {
    pub courses: Vec<CourseCard<'a>>,
    pub total: usize,
    pub filter: &'a CourseFilter,
    pub filter_options: FilterOptions,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseViewer<'a> {
    pub course: &'a Course,
    pub selection: &'a Selection,
    pub current_module: Option<&'a CourseModule>,
    pub current_lesson: Option<&'a Lesson>,
}

async fn load_view(state: &AppState, user_id: &str) -> Result<CourseBrowserView> {
    let view = CourseBrowserView::load(&state.course_service, &state.enrollment_service, user_id).await;
    match view.load_error() {
        Some(message) => Err(AppError::LoadFailed(message.to_string())),
        None => Ok(view),
    }
}

/// 获取课程目录
/// GET /api/lms/courses
pub async fn list_courses(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Query(filter): Query<CourseFilter>,
) -> Result<ApiResponse<serde_json::Value>> {
    debug!("Listing courses for user {} with filter: {:?}", user.id, filter);
    filter.validate()?;

    let mut view = load_view(&state, &user.id).await?;
    view.set_filter(filter);

    let courses: Vec<CourseCard> = view
        .visible_courses()
        .into_iter()
        .map(|course| CourseCard {
            course,
            is_enrolled: view.is_enrolled(&course.id),
            progress: view.progress_for(&course.id),
        })
        .collect();

    let body = CourseList {
        total: courses.len(),
        courses,
        filter: view.filter(),
        filter_options: view.filter_options(),
    };
    Ok(ApiResponse::success(serde_json::to_value(body)?))
}

/// 目录中出现过的分类和难度
/// GET /api/lms/courses/filters
pub async fn get_filter_options(State(state): State<Arc<AppState>>) -> Result<ApiResponse<FilterOptions>> {
    let courses = state.course_service.resolve_published_courses().await?;
    Ok(ApiResponse::success(state.course_service.filter_options(&courses)))
}

/// 打开课程查看器
/// GET /api/lms/courses/:id
pub async fn get_course(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Path(course_id): Path<String>,
) -> Result<ApiResponse<serde_json::Value>> {
    let mut view = load_view(&state, &user.id).await?;
    if view.open_course(&course_id).is_none() {
        return Err(AppError::not_found("Course"));
    }
    viewer_response(&view)
}

/// GET /api/lms/courses/:id/modules/:module_id/lessons/:lesson_id
pub async fn get_lesson(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Path((course_id, module_id, lesson_id)): Path<(String, String, String)>,
) -> Result<ApiResponse<serde_json::Value>> {
    let mut view = load_view(&state, &user.id).await?;
    if view.open_course(&course_id).is_none() {
        return Err(AppError::not_found("Course"));
    }
    if view.select_lesson(&module_id, &lesson_id).is_none() {
        return Err(AppError::not_found("Lesson"));
    }
    viewer_response(&view)
}

fn viewer_response(view: &CourseBrowserView) -> Result<ApiResponse<serde_json::Value>> {
    let course = view.current_course().ok_or_else(|| AppError::not_found("Course"))?;
    let viewer = CourseViewer {
        course,
        selection: view.selection(),
        current_module: view.current_module(),
        current_lesson: view.current_lesson(),
    };
    Ok(ApiResponse::success(serde_json::to_value(viewer)?))
}

/// 报名结果，附带本地更新后的课程卡片
#[derive(Debug, Serialize)]
pub struct EnrollResponse<'a> {
    #[serde(flatten)]
    pub result: &'a EnrollResult,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub course: Option<CourseCard<'a>>,
}

/// 报名课程；失败原因以 `success = false` 行内返回，不作为整页错误
/// POST /api/lms/courses/:id/enroll
pub async fn enroll(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Path(course_id): Path<String>,
) -> Result<ApiResponse<serde_json::Value>> {
    let mut view = CourseBrowserView::load(&state.course_service, &state.enrollment_service, &user.id).await;
    if let Some(message) = view.load_error() {
        debug!("Enrolling user {} with a partially loaded catalog: {}", user.id, message);
    }

    let result = view.enroll(&state.enrollment_service, &user.id, &course_id).await;
    let course = view.courses().iter().find(|c| c.id == course_id).map(|course| CourseCard {
        course,
        is_enrolled: view.is_enrolled(&course.id),
        progress: view.progress_for(&course.id),
    });
    let body = serde_json::to_value(EnrollResponse { result: &result, course })?;

    if result.success {
        let message = view.action_message().unwrap_or(&result.message).to_string();
        Ok(ApiResponse::success_with_message(body, message).created())
    } else {
        let message = view.action_error().unwrap_or(&result.message).to_string();
        Ok(ApiResponse::rejected(body, message))
    }
}
