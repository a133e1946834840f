use crate::{
    error::{AppError, Result},
    services::store::{DocumentQuery, DocumentStore, FilterOp, SortDirection},
};
use async_trait::async_trait;
use parking_lot::RwLock;
use serde_json::{Map, Value};
use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering as AtomicOrdering};
use tracing::debug;
use uuid::Uuid;

/// 内存文档库，用于本地开发和测试
///
/// 可以模拟缺少复合索引（带过滤条件的排序查询直接失败）以及某个集合整体不可用。
#[derive(Default)]
pub struct MemoryStore {
    collections: RwLock<HashMap<String, Vec<Value>>>,
    failing: RwLock<HashSet<String>>,
    missing_ordered_index: AtomicBool,
    query_log: RwLock<Vec<DocumentQuery>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// 带过滤条件的排序查询将报告缺少索引
    pub fn without_ordered_index(self) -> Self {
        self.missing_ordered_index.store(true, AtomicOrdering::SeqCst);
        self
    }

    pub fn insert(&self, collection: &str, document: Value) {
        self.collections
            .write()
            .entry(collection.to_string())
            .or_default()
            .push(document);
    }

    pub fn insert_many(&self, collection: &str, documents: impl IntoIterator<Item = Value>) {
        for doc in documents {
            self.insert(collection, doc);
        }
    }

    /// 之后对该集合的所有操作都会失败
    pub fn fail_collection(&self, collection: &str) {
        self.failing.write().insert(collection.to_string());
    }

    pub fn restore_collection(&self, collection: &str) {
        self.failing.write().remove(collection);
    }

    pub fn documents(&self, collection: &str) -> Vec<Value> {
        self.collections.read().get(collection).cloned().unwrap_or_default()
    }

    /// 已执行过的查询，按执行顺序
    pub fn executed_queries(&self) -> Vec<DocumentQuery> {
        self.query_log.read().clone()
    }

    fn ensure_available(&self, collection: &str) -> Result<()> {
        if self.failing.read().contains(collection) {
            return Err(AppError::query(format!("collection {} is unavailable", collection)));
        }
        Ok(())
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn query(&self, query: &DocumentQuery) -> Result<Vec<Value>> {
        self.query_log.write().push(query.clone());
        self.ensure_available(&query.collection)?;
        query.check_batch_limit()?;

        if query.order_by.is_some()
            && !query.filters.is_empty()
            && self.missing_ordered_index.load(AtomicOrdering::SeqCst)
        {
            return Err(AppError::query(format!(
                "The query on {} requires a composite index",
                query.collection
            )));
        }

        let mut matched: Vec<Value> = self
            .collections
            .read()
            .get(&query.collection)
            .map(|docs| {
                docs.iter()
                    .filter(|doc| query.filters.iter().all(|f| matches_filter(doc.get(&f.field), &f.op)))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();

        if let Some((field, direction)) = &query.order_by {
            matched.sort_by(|a, b| {
                let ord = compare_values(a.get(field), b.get(field));
                match direction {
                    SortDirection::Asc => ord,
                    SortDirection::Desc => ord.reverse(),
                }
            });
        }

        if let Some(limit) = query.limit {
            matched.truncate(limit);
        }

        debug!("Memory query on {} matched {} documents", query.collection, matched.len());
        Ok(matched)
    }

    async fn get(&self, collection: &str, id: &str) -> Result<Option<Value>> {
        self.ensure_available(collection)?;
        Ok(self
            .collections
            .read()
            .get(collection)
            .and_then(|docs| docs.iter().find(|d| d.get("id").and_then(Value::as_str) == Some(id)).cloned()))
    }

    async fn create(&self, collection: &str, document: Value) -> Result<Value> {
        self.ensure_available(collection)?;
        let mut object = match document {
            Value::Object(map) => map,
            _ => return Err(AppError::bad_request("Documents must be JSON objects")),
        };

        let has_id = object.get("id").and_then(Value::as_str).map_or(false, |id| !id.is_empty());
        if !has_id {
            object.insert("id".to_string(), Value::String(Uuid::new_v4().to_string()));
        }

        let created = Value::Object(object);
        self.insert(collection, created.clone());
        Ok(created)
    }

    async fn merge(&self, collection: &str, id: &str, patch: Value) -> Result<Option<Value>> {
        self.ensure_available(collection)?;
        let patch = match patch {
            Value::Object(map) => map,
            _ => return Err(AppError::bad_request("Patches must be JSON objects")),
        };

        let mut collections = self.collections.write();
        let Some(doc) = collections
            .get_mut(collection)
            .and_then(|docs| docs.iter_mut().find(|d| d.get("id").and_then(Value::as_str) == Some(id)))
        else {
            return Ok(None);
        };

        if let Value::Object(existing) = doc {
            merge_into(existing, patch);
        }
        Ok(Some(doc.clone()))
    }
}

fn merge_into(target: &mut Map<String, Value>, patch: Map<String, Value>) {
    for (key, value) in patch {
        target.insert(key, value);
    }
}

fn matches_filter(value: Option<&Value>, op: &FilterOp) -> bool {
    match op {
        FilterOp::Eq(expected) => value.map_or(false, |v| values_equal(v, expected)),
        FilterOp::In(candidates) => value.map_or(false, |v| candidates.iter().any(|c| values_equal(v, c))),
        FilterOp::Gte(bound) => value.map_or(false, |v| compare_values(Some(v), Some(bound)) != Ordering::Less),
    }
}

fn values_equal(a: &Value, b: &Value) -> bool {
    match (a.as_f64(), b.as_f64()) {
        (Some(x), Some(y)) => x == y,
        _ => a == b,
    }
}

/// 缺失值排在最后；数字按数值比较，其余按字符串比较
fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    match (a, b) {
        (None | Some(Value::Null), None | Some(Value::Null)) => Ordering::Equal,
        (None | Some(Value::Null), _) => Ordering::Greater,
        (_, None | Some(Value::Null)) => Ordering::Less,
        (Some(x), Some(y)) => match (x.as_f64(), y.as_f64()) {
            (Some(x), Some(y)) => x.partial_cmp(&y).unwrap_or(Ordering::Equal),
            _ => match (x.as_str(), y.as_str()) {
                (Some(x), Some(y)) => x.cmp(y),
                _ => x.to_string().cmp(&y.to_string()),
            },
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn seeded() -> MemoryStore {
        let store = MemoryStore::new();
        store.insert_many("grades", vec![
            json!({"id": "g1", "userId": "u1", "points": 70, "gradedAt": "2024-01-01T00:00:00Z"}),
            json!({"id": "g2", "userId": "u1", "points": 90, "gradedAt": "2024-03-01T00:00:00Z"}),
            json!({"id": "g3", "userId": "u2", "points": 50, "gradedAt": "2024-02-01T00:00:00Z"}),
        ]);
        store
    }

    #[tokio::test]
    async fn filters_sorts_and_limits() {
        let store = seeded();
        let query = DocumentQuery::collection("grades")
            .filter_eq("userId", "u1")
            .order_by("gradedAt", SortDirection::Desc)
            .limit(1);

        let docs = store.query(&query).await.unwrap();
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0]["id"], "g2");
        assert_eq!(store.executed_queries(), vec![query]);
    }

    #[tokio::test]
    async fn ordered_filtered_queries_fail_without_index() {
        let store = seeded().without_ordered_index();
        let ordered = DocumentQuery::collection("grades")
            .filter_eq("userId", "u1")
            .order_by("gradedAt", SortDirection::Desc);
        assert!(store.query(&ordered).await.is_err());

        let unordered = DocumentQuery::collection("grades").filter_eq("userId", "u1");
        assert_eq!(store.query(&unordered).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn create_assigns_id_and_merge_patches() {
        let store = MemoryStore::new();
        let created = store.create("courses", json!({"title": "Rust", "students": 1})).await.unwrap();
        let id = created["id"].as_str().unwrap().to_string();

        let merged = store.merge("courses", &id, json!({"students": 2})).await.unwrap().unwrap();
        assert_eq!(merged["students"], 2);
        assert_eq!(merged["title"], "Rust");

        assert!(store.merge("courses", "missing", json!({})).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn failing_collections_report_errors() {
        let store = seeded();
        store.fail_collection("grades");
        assert!(store.query(&DocumentQuery::collection("grades")).await.is_err());
        store.restore_collection("grades");
        assert_eq!(store.query(&DocumentQuery::collection("grades")).await.unwrap().len(), 3);
    }
}
