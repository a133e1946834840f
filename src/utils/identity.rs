use crate::error::{AppError, Result};
use axum::{
    async_trait,
    extract::FromRequestParts,
    http::request::Parts,
};

/// 网关注入的用户标识头
pub const USER_ID_HEADER: &str = "x-user-id";

/// 当前请求的学生
///
/// 认证由上游网关完成，这里只读取网关写入的用户 ID。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrentUser {
    pub id: String,
}

#[async_trait]
impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self> {
        let id = parts
            .headers
            .get(USER_ID_HEADER)
            .and_then(|value| value.to_str().ok())
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .ok_or_else(|| AppError::unauthorized("Missing user identity"))?;

        Ok(CurrentUser { id: id.to_string() })
    }
}
