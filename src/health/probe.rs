//! 探测器接口
//!
//! Shell 与 Web 两种探测器共用同一个执行契约

use crate::config::CheckDefinition;
use async_trait::async_trait;
use regex::Regex;

/// 一次探测的结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeOutcome {
    /// 是否成功
    pub success: bool,
    /// 失败时的诊断信息
    pub diagnostic: Option<String>,
}

impl ProbeOutcome {
    /// 成功结果
    pub fn success() -> Self {
        Self {
            success: true,
            diagnostic: None,
        }
    }

    /// 失败结果
    pub fn failure(diagnostic: impl Into<String>) -> Self {
        Self {
            success: false,
            diagnostic: Some(diagnostic.into()),
        }
    }
}

/// 探测器trait
#[async_trait]
pub trait Probe: Send + Sync {
    /// 对检查项执行一次探测
    ///
    /// 探测失败（包括正则表达式无效）通过 [`ProbeOutcome`] 返回，而不是错误
    async fn execute(&self, definition: &CheckDefinition) -> ProbeOutcome;
}

/// 用检查项的 match 规则校验输出
///
/// 未配置 match 时直接通过；正则无法编译时返回失败诊断
pub(crate) fn verify_match(pattern: Option<&str>, output: &str) -> Result<(), String> {
    let Some(pattern) = pattern else {
        return Ok(());
    };

    let regex = Regex::new(pattern).map_err(|e| format!("invalid match pattern `{pattern}`: {e}"))?;
    if regex.is_match(output) {
        Ok(())
    } else {
        Err(format!("expected `{pattern}`, got `{output}`"))
    }
}
