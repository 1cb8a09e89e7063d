//! HTTP 探测器实现
//!
//! 对检查地址发起 GET 请求，校验状态码和响应体，最多跟随 10 次重定向

use crate::config::CheckDefinition;
use crate::error::HealthCheckError;
use crate::health::probe::{verify_match, Probe, ProbeOutcome};
use async_trait::async_trait;
use reqwest::{redirect, Client};
use std::error::Error as _;
use std::time::Duration;
use tracing::debug;

/// 固定的 User-Agent，重定向后的请求同样携带
pub const USER_AGENT: &str = "jsonmon";

/// 最多跟随的重定向次数
pub const MAX_REDIRECTS: usize = 10;

/// HTTP 探测器
#[derive(Debug, Clone)]
pub struct WebProbe {
    /// HTTP客户端
    client: Client,
}

impl WebProbe {
    /// 创建新的 HTTP 探测器
    ///
    /// # 参数
    /// * `timeout` - 单次请求超时时间
    pub fn new(timeout: Duration) -> Result<Self, HealthCheckError> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .redirect(redirect_policy())
            .build()
            .map_err(HealthCheckError::Client)?;

        Ok(Self { client })
    }
}

/// 重定向策略：第 11 次重定向时报错
fn redirect_policy() -> redirect::Policy {
    redirect::Policy::custom(|attempt| {
        if attempt.previous().len() > MAX_REDIRECTS {
            attempt.error(format!("stopped after {MAX_REDIRECTS} redirects"))
        } else {
            attempt.follow()
        }
    })
}

/// 格式化请求错误，包含完整的错误链
fn format_request_error(error: &reqwest::Error) -> String {
    let mut message = if error.is_redirect() {
        format!("too many redirects: {error}")
    } else {
        error.to_string()
    };

    let mut source = error.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }

    message
}

#[async_trait]
impl Probe for WebProbe {
    async fn execute(&self, definition: &CheckDefinition) -> ProbeOutcome {
        let Some(url) = definition.web.as_deref().filter(|u| !u.is_empty()) else {
            return ProbeOutcome::failure("no web address configured");
        };

        debug!("执行Web检查: {}", url);

        let response = match self.client.get(url).send().await {
            Ok(response) => response,
            Err(e) => return ProbeOutcome::failure(format_request_error(&e)),
        };

        let status = response.status().as_u16();
        let expected = definition.expected_code();
        if status != expected {
            return ProbeOutcome::failure(format!("{url} returned {status}, expected {expected}"));
        }

        let Some(pattern) = definition.match_pattern() else {
            return ProbeOutcome::success();
        };

        let body = match response.text().await {
            Ok(body) => body,
            Err(e) => return ProbeOutcome::failure(format_request_error(&e)),
        };

        match verify_match(Some(pattern), &body) {
            Ok(()) => ProbeOutcome::success(),
            Err(diagnostic) => ProbeOutcome::failure(diagnostic),
        }
    }
}
