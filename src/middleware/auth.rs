//! Bearer token 认证中间件
//!
//! 提供 `RequireToken` extractor，替代每个 handler 中重复的 token 校验逻辑

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{
        header::{HeaderMap, AUTHORIZATION},
        request::Parts,
    },
};
use std::sync::Arc;
use subtle::ConstantTimeEq;

use crate::error::Error;
use crate::state::AppState;

/// Bearer token 认证 Extractor
///
/// 放在 handler 参数的第一位，保证在路径解析之前完成认证
///
/// # Example
///
/// ```ignore
/// async fn protected_handler(
///     _auth: RequireToken,
///     State(state): State<Arc<AppState>>,
/// ) -> impl IntoResponse {
///     // handler 逻辑...
/// }
/// ```
#[derive(Debug, Clone)]
pub struct RequireToken;

#[async_trait]
impl FromRequestParts<Arc<AppState>> for RequireToken {
    type Rejection = Error;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        verify_bearer_token(&parts.headers, state.token())
    }
}

/// 验证 `Authorization: Bearer <token>`
///
/// scheme 大小写不敏感，token 必须完全一致
pub fn verify_bearer_token(headers: &HeaderMap, expected: &str) -> Result<RequireToken, Error> {
    let Some(value) = headers.get(AUTHORIZATION) else {
        tracing::warn!("Missing Authorization header");
        return Err(Error::Unauthorized);
    };

    let Some(token) = value.to_str().ok().and_then(parse_bearer) else {
        tracing::warn!("Malformed Authorization header");
        return Err(Error::Unauthorized);
    };

    if token_matches(token, expected) {
        Ok(RequireToken)
    } else {
        tracing::warn!("Invalid bearer token provided");
        Err(Error::Unauthorized)
    }
}

/// 常量时间比较，长度不同直接返回
fn token_matches(presented: &str, expected: &str) -> bool {
    presented.len() == expected.len()
        && bool::from(presented.as_bytes().ct_eq(expected.as_bytes()))
}

fn parse_bearer(value: &str) -> Option<&str> {
    let (scheme, token) = value.trim().split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = token.trim();
    (!token.is_empty()).then_some(token)
}
