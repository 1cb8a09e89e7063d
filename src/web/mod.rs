//! Web API模块
//!
//! 提供只读的 `/status` 与 `/version` 两个 JSON 接口

use crate::status::StatusCache;
use crate::version::VersionInfo;
use axum::{
    http::{header, HeaderValue},
    routing::get,
    Router,
};
use std::sync::Arc;
use tower_http::{set_header::SetResponseHeaderLayer, trace::TraceLayer};

pub mod handlers;
pub mod server;

pub use server::WebServer;

/// Web服务器状态
#[derive(Clone)]
pub struct WebAppState {
    /// 共享状态缓存
    pub cache: Arc<StatusCache>,
    /// 版本信息
    pub version: Arc<VersionInfo>,
}

impl WebAppState {
    /// 创建新的Web服务器状态
    pub fn new(cache: Arc<StatusCache>, version: VersionInfo) -> Self {
        Self {
            cache,
            version: Arc::new(version),
        }
    }
}

/// 构建路由
///
/// 所有响应（包括 304 与 404）都带有统一的缓存与安全头
pub fn build_router(state: WebAppState) -> Router {
    Router::new()
        .route("/status", get(handlers::status))
        .route("/version", get(handlers::version))
        .with_state(state)
        .layer(SetResponseHeaderLayer::overriding(
            header::CACHE_CONTROL,
            HeaderValue::from_static("no-cache"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::ACCESS_CONTROL_ALLOW_ORIGIN,
            HeaderValue::from_static("*"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::X_CONTENT_TYPE_OPTIONS,
            HeaderValue::from_static("nosniff"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::SERVER,
            HeaderValue::from_static(crate::APP_NAME),
        ))
        .layer(TraceLayer::new_for_http())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CheckDefinition;
    use axum::{
        body::{to_bytes, Body},
        http::{Request, StatusCode},
        response::Response,
    };
    use chrono::Utc;
    use tower::ServiceExt;

    fn test_state() -> WebAppState {
        let definitions = vec![
            CheckDefinition::shell("echo ok"),
            CheckDefinition {
                name: Some("api".to_string()),
                ..CheckDefinition::web("http://localhost:9/health")
            },
        ];
        WebAppState::new(
            Arc::new(StatusCache::new(&definitions)),
            VersionInfo::current(),
        )
    }

    async fn get(router: Router, uri: &str, etag: Option<&str>) -> Response {
        let mut request = Request::builder().uri(uri);
        if let Some(etag) = etag {
            request = request.header(header::IF_NONE_MATCH, etag);
        }
        router
            .oneshot(request.body(Body::empty()).unwrap())
            .await
            .unwrap()
    }

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn etag_of(response: &Response) -> String {
        response.headers()[header::ETAG].to_str().unwrap().to_string()
    }

    #[tokio::test]
    async fn test_status_returns_checks_in_order() {
        let state = test_state();
        let response = get(build_router(state.clone()), "/status", None).await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            handlers::JSON_CONTENT_TYPE
        );
        assert_eq!(etag_of(&response), state.cache.change_token().await);

        let json = body_json(response).await;
        let checks = json.as_array().unwrap();
        assert_eq!(checks.len(), 2);
        assert_eq!(checks[0]["shell"], "echo ok");
        assert_eq!(checks[0]["failed"], false);
        assert!(checks[0].get("since").is_none());
        assert_eq!(checks[0]["name"], "echo ok");
        assert_eq!(checks[1]["name"], "api");
        assert_eq!(checks[1]["web"], "http://localhost:9/health");
    }

    #[tokio::test]
    async fn test_status_conditional_get() {
        let state = test_state();
        let first = get(build_router(state.clone()), "/status", None).await;
        let token = etag_of(&first);

        let unchanged = get(build_router(state.clone()), "/status", Some(&token)).await;
        assert_eq!(unchanged.status(), StatusCode::NOT_MODIFIED);
        assert!(unchanged.headers().get(header::ETAG).is_none());
        let body = to_bytes(unchanged.into_body(), usize::MAX).await.unwrap();
        assert!(body.is_empty());

        state.cache.record_transition(0, true, Utc::now()).await.unwrap();

        let changed = get(build_router(state.clone()), "/status", Some(&token)).await;
        assert_eq!(changed.status(), StatusCode::OK);
        assert_ne!(etag_of(&changed), token);
        let json = body_json(changed).await;
        assert_eq!(json[0]["failed"], true);
        assert!(json[0]["since"].is_string());
    }

    #[tokio::test]
    async fn test_version_uses_started_token() {
        let state = test_state();
        let started = state.cache.started_token().to_string();

        state.cache.record_transition(0, true, Utc::now()).await.unwrap();

        let response = get(build_router(state.clone()), "/version", None).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(etag_of(&response), started);
        let json = body_json(response).await;
        assert_eq!(json["jsonmon"], crate::VERSION);

        let cached = get(build_router(state), "/version", Some(&started)).await;
        assert_eq!(cached.status(), StatusCode::NOT_MODIFIED);
    }

    #[tokio::test]
    async fn test_common_headers_on_every_response() {
        let state = test_state();
        for (uri, expected) in [
            ("/status", StatusCode::OK),
            ("/version", StatusCode::OK),
            ("/missing", StatusCode::NOT_FOUND),
        ] {
            let response = get(build_router(state.clone()), uri, None).await;
            assert_eq!(response.status(), expected, "{uri}");
            let headers = response.headers();
            assert_eq!(headers[header::CACHE_CONTROL], "no-cache");
            assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
            assert_eq!(headers[header::X_CONTENT_TYPE_OPTIONS], "nosniff");
            assert_eq!(headers[header::SERVER], "jsonmon");
        }
    }
}
