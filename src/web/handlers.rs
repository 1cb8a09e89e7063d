//! Web 路由处理函数
//!
//! `/status` 与 `/version` 均支持基于 ETag 的条件请求

use super::WebAppState;
use crate::status::Conditional;
use axum::{
    extract::State,
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use tracing::error;

/// JSON 响应的 Content-Type
pub const JSON_CONTENT_TYPE: &str = "application/json; charset=utf-8";

/// 读取客户端提供的缓存校验值
fn if_none_match(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::IF_NONE_MATCH)
        .and_then(|value| value.to_str().ok())
}

/// 构建带 ETag 的 JSON 响应
fn json_response(etag: &str, body: Vec<u8>) -> Response {
    match HeaderValue::from_str(etag) {
        Ok(etag) => (
            [
                (header::CONTENT_TYPE, HeaderValue::from_static(JSON_CONTENT_TYPE)),
                (header::ETAG, etag),
            ],
            body,
        )
            .into_response(),
        Err(e) => {
            error!("无效的ETag {}: {}", etag, e);
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

/// 检查项状态
pub async fn status(State(app_state): State<WebAppState>, headers: HeaderMap) -> Response {
    match app_state.cache.render_if_modified(if_none_match(&headers)).await {
        Ok(Conditional::NotModified) => StatusCode::NOT_MODIFIED.into_response(),
        Ok(Conditional::Modified { etag, body }) => json_response(&etag, body),
        Err(e) => {
            error!("状态序列化失败: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

/// 版本信息
pub async fn version(State(app_state): State<WebAppState>, headers: HeaderMap) -> Response {
    let started = app_state.cache.started_token();
    if if_none_match(&headers) == Some(started) {
        return StatusCode::NOT_MODIFIED.into_response();
    }

    match serde_json::to_vec(app_state.version.as_ref()) {
        Ok(body) => json_response(started, body),
        Err(e) => {
            error!("版本信息序列化失败: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}
