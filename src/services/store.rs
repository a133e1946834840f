use crate::error::{AppError, Result};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;

/// 文档库对 `IN` 批量查询的上限
pub const IN_QUERY_LIMIT: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

#[derive(Debug, Clone, PartialEq)]
pub enum FilterOp {
    Eq(Value),
    In(Vec<Value>),
    Gte(Value),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Filter {
    pub field: String,
    pub op: FilterOp,
}

/// 单集合查询：等值/IN/下界过滤条件取交集，可选单字段排序和条数限制
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentQuery {
    pub collection: String,
    pub filters: Vec<Filter>,
    pub order_by: Option<(String, SortDirection)>,
    pub limit: Option<usize>,
}

impl DocumentQuery {
    pub fn collection(name: &str) -> Self {
        Self {
            collection: name.to_string(),
            filters: Vec::new(),
            order_by: None,
            limit: None,
        }
    }

    pub fn filter_eq(mut self, field: &str, value: impl Into<Value>) -> Self {
        self.filters.push(Filter { field: field.to_string(), op: FilterOp::Eq(value.into()) });
        self
    }

    pub fn filter_in<V: Into<Value>>(mut self, field: &str, values: impl IntoIterator<Item = V>) -> Self {
        let values = values.into_iter().map(Into::into).collect();
        self.filters.push(Filter { field: field.to_string(), op: FilterOp::In(values) });
        self
    }

    pub fn filter_gte(mut self, field: &str, value: impl Into<Value>) -> Self {
        self.filters.push(Filter { field: field.to_string(), op: FilterOp::Gte(value.into()) });
        self
    }

    pub fn order_by(mut self, field: &str, direction: SortDirection) -> Self {
        self.order_by = Some((field.to_string(), direction));
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// 检查 IN 列表是否超过批量上限
    pub fn check_batch_limit(&self) -> Result<()> {
        for filter in &self.filters {
            if let FilterOp::In(values) = &filter.op {
                if values.len() > IN_QUERY_LIMIT {
                    return Err(AppError::query(format!(
                        "'in' filter on {} supports at most {} values, got {}",
                        filter.field,
                        IN_QUERY_LIMIT,
                        values.len()
                    )));
                }
            }
        }
        Ok(())
    }
}

/// 托管文档库的最小接口
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// 执行集合查询；缺少复合索引时可能失败
    async fn query(&self, query: &DocumentQuery) -> Result<Vec<Value>>;

    async fn get(&self, collection: &str, id: &str) -> Result<Option<Value>>;

    async fn create(&self, collection: &str, document: Value) -> Result<Value>;

    async fn merge(&self, collection: &str, id: &str, patch: Value) -> Result<Option<Value>>;
}

pub type SharedStore = Arc<dyn DocumentStore>;

/// 把原始文档批量反序列化为模型
pub fn decode_all<T: DeserializeOwned>(documents: Vec<Value>) -> Result<Vec<T>> {
    documents
        .into_iter()
        .map(|doc| serde_json::from_value(doc).map_err(AppError::from))
        .collect()
}
