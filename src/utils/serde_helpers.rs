/// 文档字段的序列化/反序列化辅助模块

use serde::{Deserialize, Deserializer, Serializer};

/// 处理 SurrealDB 的 Thing ID 格式 (例如: "course:xxxxx")
///
/// 输出统一为不带表名前缀的纯 ID，方便与 `courseId` 等引用字段直接比较。
pub mod thing_id {
    use super::*;

    pub fn serialize<S>(id: &str, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(id)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<String, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum IdValue {
            String(String),
            Number(i64),
            Thing {
                #[allow(dead_code)]
                tb: String,
                id: serde_json::Value,
            },
        }

        match IdValue::deserialize(deserializer)? {
            IdValue::String(s) => Ok(strip_table(&s).to_string()),
            IdValue::Number(n) => Ok(n.to_string()),
            IdValue::Thing { id, .. } => match id {
                serde_json::Value::String(s) => Ok(s),
                serde_json::Value::Number(n) => Ok(n.to_string()),
                serde_json::Value::Object(map) => Ok(map
                    .get("String")
                    .and_then(|v| v.as_str())
                    .map(str::to_string)
                    .unwrap_or_else(|| serde_json::Value::Object(map).to_string())),
                other => Ok(other.to_string()),
            },
        }
    }

    fn strip_table(raw: &str) -> &str {
        match raw.split_once(':') {
            Some((table, id)) if !table.is_empty() && table.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') => {
                id.trim_matches('`').trim_start_matches('⟨').trim_end_matches('⟩')
            }
            _ => raw,
        }
    }
}

/// 可选时间戳：兼容 RFC3339 字符串、毫秒时间戳以及 `{seconds, nanoseconds}` 对象
pub mod opt_timestamp {
    use super::*;
    use chrono::{DateTime, TimeZone, Utc};

    pub fn serialize<S>(value: &Option<DateTime<Utc>>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(ts) => serializer.serialize_some(&ts.to_rfc3339()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Text(String),
            Millis(i64),
            Parts {
                seconds: i64,
                #[serde(default, alias = "nanos")]
                nanoseconds: u32,
            },
        }

        let parsed = match Option::<Raw>::deserialize(deserializer)? {
            None => None,
            Some(Raw::Text(s)) => DateTime::parse_from_rfc3339(&s)
                .ok()
                .map(|dt| dt.with_timezone(&Utc)),
            Some(Raw::Millis(ms)) => Utc.timestamp_millis_opt(ms).single(),
            Some(Raw::Parts { seconds, nanoseconds }) => Utc.timestamp_opt(seconds, nanoseconds).single(),
        };
        Ok(parsed)
    }
}

/// 宽松计数：整数、浮点数（四舍五入）或数字字符串，其他类型视为缺失
pub mod lenient_count {
    use super::*;

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Option::<serde_json::Value>::deserialize(deserializer)?;
        Ok(value.as_ref().and_then(parse))
    }

    pub fn parse(value: &serde_json::Value) -> Option<i64> {
        match value {
            serde_json::Value::Number(n) => n
                .as_i64()
                .or_else(|| n.as_f64().filter(|f| f.is_finite()).map(|f| f.round() as i64)),
            serde_json::Value::String(s) => s.trim().parse::<f64>().ok().filter(|f| f.is_finite()).map(|f| f.round() as i64),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Utc};
    use serde_json::json;

    #[derive(Deserialize)]
    struct Doc {
        #[serde(with = "thing_id")]
        id: String,
        #[serde(default, with = "opt_timestamp")]
        at: Option<DateTime<Utc>>,
    }

    #[derive(Deserialize)]
    struct Counted {
        #[serde(default, with = "lenient_count")]
        count: Option<i64>,
    }

    #[test]
    fn counts_accept_floats_and_ignore_garbage() {
        let parse = |v: serde_json::Value| serde_json::from_value::<Counted>(json!({ "count": v })).unwrap().count;
        assert_eq!(parse(json!(12.0)), Some(12));
        assert_eq!(parse(json!(3)), Some(3));
        assert_eq!(parse(json!(2.6)), Some(3));
        assert_eq!(parse(json!("7")), Some(7));
        assert_eq!(parse(json!({"n": 1})), None);
        assert_eq!(parse(json!(null)), None);
        assert_eq!(serde_json::from_value::<Counted>(json!({})).unwrap().count, None);
    }

    #[test]
    fn thing_ids_are_flattened() {
        let doc: Doc = serde_json::from_value(json!({"id": "course:abc"})).unwrap();
        assert_eq!(doc.id, "abc");

        let doc: Doc = serde_json::from_value(json!({"id": {"tb": "course", "id": "xyz"}})).unwrap();
        assert_eq!(doc.id, "xyz");

        let doc: Doc = serde_json::from_value(json!({"id": "plain"})).unwrap();
        assert_eq!(doc.id, "plain");
    }

    #[test]
    fn timestamps_accept_several_shapes() {
        let doc: Doc = serde_json::from_value(json!({"id": "a", "at": "2024-03-01T10:00:00Z"})).unwrap();
        assert_eq!(doc.at.unwrap().to_rfc3339(), "2024-03-01T10:00:00+00:00");

        let doc: Doc = serde_json::from_value(json!({"id": "a", "at": 1_700_000_000_000i64})).unwrap();
        assert_eq!(doc.at.unwrap().timestamp(), 1_700_000_000);

        let doc: Doc = serde_json::from_value(json!({"id": "a", "at": {"seconds": 1_700_000_000, "nanoseconds": 0}})).unwrap();
        assert_eq!(doc.at.unwrap().timestamp(), 1_700_000_000);

        let doc: Doc = serde_json::from_value(json!({"id": "a"})).unwrap();
        assert!(doc.at.is_none());

        let doc: Doc = serde_json::from_value(json!({"id": "a", "at": "not a date"})).unwrap();
        assert!(doc.at.is_none());
    }
}
