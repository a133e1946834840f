use crate::{
    error::Result,
    models::assignment::Assignment,
    services::store::{decode_all, DocumentQuery, SharedStore, IN_QUERY_LIMIT},
};
use chrono::{DateTime, Utc};
use tracing::debug;

pub const ASSIGNMENTS: &str = "assignments";

#[derive(Clone)]
pub struct AssignmentService {
    store: SharedStore,
}

impl AssignmentService {
    pub async fn new(store: SharedStore) -> Result<Self> {
        Ok(Self { store })
    }

    /// 指定课程中尚未到期的作业，按截止时间升序
    pub async fn get_upcoming_assignments(
        &self,
        user_id: &str,
        course_ids: &[String],
        limit: usize,
    ) -> Result<Vec<Assignment>> {
        self.upcoming_since(user_id, course_ids, limit, Utc::now()).await
    }

    pub async fn upcoming_since(
        &self,
        user_id: &str,
        course_ids: &[String],
        limit: usize,
        now: DateTime<Utc>,
    ) -> Result<Vec<Assignment>> {
        if course_ids.is_empty() {
            return Ok(Vec::new());
        }
        debug!("Fetching upcoming assignments for user {} across {} courses", user_id, course_ids.len());

        // dueDate 可能是字符串、毫秒或 {seconds, nanoseconds}，按解析后的时间在本地过滤排序
        let batch: Vec<&str> = course_ids.iter().take(IN_QUERY_LIMIT).map(String::as_str).collect();
        let query = DocumentQuery::collection(ASSIGNMENTS).filter_in("courseId", batch);
        let assignments: Vec<Assignment> = decode_all(self.store.query(&query).await?)?;

        Ok(upcoming(assignments, now, limit))
    }
}

/// 截止时间不早于 `now` 的作业，升序，最多 `limit` 条；缺少截止时间的作业不计入
pub fn upcoming(assignments: Vec<Assignment>, now: DateTime<Utc>, limit: usize) -> Vec<Assignment> {
    let mut due: Vec<(DateTime<Utc>, Assignment)> = assignments
        .into_iter()
        .filter_map(|a| a.due_date.filter(|d| *d >= now).map(|d| (d, a)))
        .collect();
    due.sort_by_key(|(d, _)| *d);
    due.into_iter().take(limit).map(|(_, a)| a).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::memory_store::MemoryStore;
    use chrono::TimeZone;
    use serde_json::json;
    use std::sync::Arc;

    #[tokio::test]
    async fn only_future_assignments_of_enrolled_courses() {
        let store = Arc::new(MemoryStore::new());
        store.insert_many(ASSIGNMENTS, vec![
            json!({"id": "a1", "title": "Past", "courseId": "c1", "dueDate": "2024-01-01T00:00:00Z"}),
            json!({"id": "a2", "title": "Later", "courseId": "c1", "dueDate": "2024-09-01T00:00:00Z"}),
            json!({"id": "a3", "title": "Soon", "courseId": "c2", "dueDate": "2024-07-01T00:00:00Z"}),
            json!({"id": "a4", "title": "Other", "courseId": "c3", "dueDate": "2024-07-02T00:00:00Z"}),
        ]);
        let service = AssignmentService::new(store).await.unwrap();
        let now = Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap();

        let upcoming = service
            .upcoming_since("u1", &["c1".to_string(), "c2".to_string()], 5, now)
            .await
            .unwrap();
        let titles: Vec<&str> = upcoming.iter().map(|a| a.title.as_str()).collect();
        assert_eq!(titles, vec!["Soon", "Later"]);
    }

    #[tokio::test]
    async fn numeric_due_dates_are_compared_as_times() {
        let store = Arc::new(MemoryStore::new());
        let now = Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap();
        let past_ms = Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap().timestamp_millis();
        let future_secs = Utc.with_ymd_and_hms(2024, 6, 10, 0, 0, 0).unwrap().timestamp();
        store.insert_many(ASSIGNMENTS, vec![
            json!({"id": "a1", "title": "Past millis", "courseId": "c1", "dueDate": past_ms}),
            json!({"id": "a2", "title": "Future parts", "courseId": "c1", "dueDate": {"seconds": future_secs, "nanoseconds": 0}}),
            json!({"id": "a3", "title": "Future text", "courseId": "c1", "dueDate": "2024-06-05T00:00:00Z"}),
            json!({"id": "a4", "title": "Undated", "courseId": "c1"}),
        ]);
        let service = AssignmentService::new(store).await.unwrap();

        let upcoming = service.upcoming_since("u1", &["c1".to_string()], 5, now).await.unwrap();
        let titles: Vec<&str> = upcoming.iter().map(|a| a.title.as_str()).collect();
        assert_eq!(titles, vec!["Future text", "Future parts"]);

        let first = service.upcoming_since("u1", &["c1".to_string()], 1, now).await.unwrap();
        assert_eq!(first[0].title, "Future text");
    }

    #[tokio::test]
    async fn no_courses_means_no_query() {
        let store = Arc::new(MemoryStore::new());
        let service = AssignmentService::new(store.clone()).await.unwrap();
        assert!(service.get_upcoming_assignments("u1", &[], 5).await.unwrap().is_empty());
        assert!(store.executed_queries().is_empty());
    }
}
