use crate::models::{course::Course, filter::{CourseFilter, FilterOptions, ALL}};
use std::collections::{BTreeSet, HashSet};

/// 按筛选条件过滤课程，保持原有顺序
///
/// 所有启用的条件取逻辑与：搜索词（去掉首尾空白后非空才生效，匹配标题/描述/分类，不区分大小写）、
/// 分类精确匹配、难度精确匹配、仅看已报名。
pub fn filter_courses<'a>(
    courses: &'a [Course],
    filter: &CourseFilter,
    active_enrollments: &HashSet<String>,
) -> Vec<&'a Course> {
    let term = filter.search_term.trim().to_lowercase();

    courses
        .iter()
        .filter(|course| term.is_empty() || matches_search(course, &term))
        .filter(|course| filter.category == ALL || course.category == filter.category)
        .filter(|course| filter.level == ALL || course.level.as_str() == filter.level)
        .filter(|course| !filter.enrolled_only || active_enrollments.contains(&course.id))
        .collect()
}

fn matches_search(course: &Course, term: &str) -> bool {
    course.title.to_lowercase().contains(term)
        || course.description.to_lowercase().contains(term)
        || course.category.to_lowercase().contains(term)
}

/// 从完整（未过滤的）课程列表收集去重并排序的分类与难度
pub fn filter_options(courses: &[Course]) -> FilterOptions {
    let categories: BTreeSet<&str> = courses.iter().map(|c| c.category.as_str()).collect();
    let levels: BTreeSet<&str> = courses.iter().map(|c| c.level.as_str()).collect();

    FilterOptions {
        categories: categories.into_iter().map(str::to_string).collect(),
        levels: levels.into_iter().map(str::to_string).collect(),
    }
}
