use crate::{
    error::Result,
    models::grade::Grade,
    services::store::{decode_all, DocumentQuery, SharedStore, SortDirection},
};
use tracing::debug;

pub const GRADES: &str = "grades";

#[derive(Clone)]
pub struct GradeService {
    store: SharedStore,
}

impl GradeService {
    pub async fn new(store: SharedStore) -> Result<Self> {
        Ok(Self { store })
    }

    /// 最近的成绩，按评分时间倒序
    pub async fn get_recent_grades(&self, user_id: &str, limit: usize) -> Result<Vec<Grade>> {
        debug!("Fetching {} recent grades for user: {}", limit, user_id);
        let query = DocumentQuery::collection(GRADES)
            .filter_eq("userId", user_id)
            .order_by("gradedAt", SortDirection::Desc)
            .limit(limit);
        decode_all(self.store.query(&query).await?)
    }
}
