use crate::config::Config;
use crate::error::{AppError, Result};
use crate::services::store::{DocumentQuery, DocumentStore, FilterOp, SortDirection};
use async_trait::async_trait;
use serde_json::{json, Map, Value};
use surrealdb::engine::remote::http::{Client, Http};
use surrealdb::opt::auth::Root;
use surrealdb::Surreal;
use tracing::{debug, error, info};

/// 数据库服务
#[derive(Clone)]
pub struct Database {
    pub client: Surreal<Client>,
    pub config: Config,
}

impl Database {
    /// 创建新的数据库实例
    pub async fn new(config: &Config) -> Result<Self> {
        info!("Initializing database connection to {}", config.database_url);

        let address = config
            .database_url
            .trim_start_matches("http://")
            .trim_start_matches("https://");

        let client = Surreal::new::<Http>(address).await?;
        client
            .signin(Root {
                username: &config.database_username,
                password: &config.database_password,
            })
            .await?;
        client
            .use_ns(&config.database_namespace)
            .use_db(&config.database_name)
            .await?;

        Ok(Self {
            client,
            config: config.clone(),
        })
    }

    /// 验证数据库连接
    pub async fn verify_connection(&self) -> Result<()> {
        match self.client.health().await {
            Ok(_) => {
                info!("Database connection verified successfully");
                Ok(())
            }
            Err(e) => {
                error!("Failed to verify database connection: {}", e);
                Err(AppError::from(e))
            }
        }
    }

    /// 执行带参数的查询，返回第一条语句的结果
    async fn run(&self, sql: &str, params: Value) -> Result<Vec<Value>> {
        debug!("Executing query: {}", sql);
        let mut response = self.client.query(sql).bind(params).await?;
        let value: surrealdb::sql::Value = response.take(0)?;
        Ok(match value.into_json() {
            Value::Array(items) => items,
            Value::Null => Vec::new(),
            single => vec![single],
        })
    }
}

/// 把文档查询翻译为 SurrealQL，字段名只允许标识符字符
pub fn build_select(query: &DocumentQuery) -> Result<(String, Value)> {
    let mut params = Map::new();
    params.insert("table".to_string(), json!(query.collection));

    let mut conditions = Vec::new();
    for (index, filter) in query.filters.iter().enumerate() {
        let field = match checked_field(&filter.field)? {
            // 记录 ID 是 Thing，按纯 ID 比较
            "id" => "meta::id(id)",
            other => other,
        };
        let name = format!("p{}", index);
        let condition = match &filter.op {
            FilterOp::Eq(value) => {
                params.insert(name.clone(), value.clone());
                format!("{} = ${}", field, name)
            }
            FilterOp::In(values) => {
                params.insert(name.clone(), Value::Array(values.clone()));
                format!("{} INSIDE ${}", field, name)
            }
            FilterOp::Gte(value) => {
                params.insert(name.clone(), value.clone());
                format!("{} >= ${}", field, name)
            }
        };
        conditions.push(condition);
    }

    let mut sql = "SELECT * FROM type::table($table)".to_string();
    if !conditions.is_empty() {
        sql.push_str(" WHERE ");
        sql.push_str(&conditions.join(" AND "));
    }
    if let Some((field, direction)) = &query.order_by {
        let field = checked_field(field)?;
        let direction = match direction {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        };
        sql.push_str(&format!(" ORDER BY {} {}", field, direction));
    }
    if let Some(limit) = query.limit {
        sql.push_str(&format!(" LIMIT {}", limit));
    }

    Ok((sql, Value::Object(params)))
}

fn checked_field(field: &str) -> Result<&str> {
    if !field.is_empty() && field.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        Ok(field)
    } else {
        Err(AppError::query(format!("Invalid field name: {}", field)))
    }
}

#[async_trait]
impl DocumentStore for Database {
    async fn query(&self, query: &DocumentQuery) -> Result<Vec<Value>> {
        query.check_batch_limit()?;
        let (sql, params) = build_select(query)?;
        self.run(&sql, params).await
    }

    async fn get(&self, collection: &str, id: &str) -> Result<Option<Value>> {
        let docs = self
            .run(
                "SELECT * FROM type::thing($table, $id)",
                json!({ "table": collection, "id": id }),
            )
            .await?;
        Ok(docs.into_iter().next())
    }

    async fn create(&self, collection: &str, document: Value) -> Result<Value> {
        let mut content = match document {
            Value::Object(map) => map,
            _ => return Err(AppError::bad_request("Documents must be JSON objects")),
        };

        let explicit_id = content
            .remove("id")
            .and_then(|id| id.as_str().map(str::to_string))
            .filter(|id| !id.is_empty());

        let docs = match explicit_id {
            Some(id) => {
                self.run(
                    "CREATE type::thing($table, $id) CONTENT $content",
                    json!({ "table": collection, "id": id, "content": content }),
                )
                .await?
            }
            None => {
                self.run(
                    "CREATE type::table($table) CONTENT $content",
                    json!({ "table": collection, "content": content }),
                )
                .await?
            }
        };

        docs.into_iter()
            .next()
            .ok_or_else(|| AppError::Internal("Failed to create record".to_string()))
    }

    async fn merge(&self, collection: &str, id: &str, patch: Value) -> Result<Option<Value>> {
        let docs = self
            .run(
                "UPDATE type::thing($table, $id) MERGE $patch RETURN AFTER",
                json!({ "table": collection, "id": id, "patch": patch }),
            )
            .await?;
        Ok(docs.into_iter().next())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn select_includes_filters_order_and_limit() {
        let query = DocumentQuery::collection("assignments")
            .filter_in("courseId", vec!["c1", "c2"])
            .filter_gte("dueDate", "2024-01-01T00:00:00Z")
            .order_by("dueDate", SortDirection::Asc)
            .limit(5);

        let (sql, params) = build_select(&query).unwrap();
        assert_eq!(
            sql,
            "SELECT * FROM type::table($table) WHERE courseId INSIDE $p0 AND dueDate >= $p1 ORDER BY dueDate ASC LIMIT 5"
        );
        assert_eq!(params["table"], "assignments");
        assert_eq!(params["p0"], json!(["c1", "c2"]));
    }

    #[test]
    fn unfiltered_select_has_no_where_clause() {
        let (sql, _) = build_select(&DocumentQuery::collection("courses")).unwrap();
        assert_eq!(sql, "SELECT * FROM type::table($table)");
    }

    #[test]
    fn id_filters_compare_plain_ids() {
        let query = DocumentQuery::collection("courses").filter_in("id", vec!["c1"]);
        let (sql, _) = build_select(&query).unwrap();
        assert_eq!(sql, "SELECT * FROM type::table($table) WHERE meta::id(id) INSIDE $p0");
    }

    #[test]
    fn field_names_are_checked() {
        let query = DocumentQuery::collection("courses").filter_eq("status; DELETE course", "x");
        assert!(build_select(&query).is_err());
    }
}
