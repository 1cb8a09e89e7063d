//! 配置数据结构定义
//!
//! 定义检查项配置、监听配置以及检查目标的校验逻辑

use crate::error::{ConfigError, ServerError};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// 主配置结构
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Config {
    /// Web检查的请求超时时间（秒）
    #[serde(default = "default_request_timeout")]
    pub request_timeout: u64,
    /// 检查项列表，顺序即为状态接口的输出顺序
    #[serde(default)]
    pub checks: Vec<CheckDefinition>,
}

impl Config {
    /// 由检查项列表构建配置，其余字段使用默认值
    pub fn from_checks(checks: Vec<CheckDefinition>) -> Self {
        Self {
            request_timeout: default_request_timeout(),
            checks,
        }
    }

    /// Web检查的请求超时时间
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout.max(1))
    }
}

/// 单个检查项的定义，加载后只读
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct CheckDefinition {
    /// 显示名称，未设置时使用检查目标
    #[serde(default)]
    pub name: Option<String>,
    /// HTTP检查地址
    #[serde(default)]
    pub web: Option<String>,
    /// Shell检查命令
    #[serde(default)]
    pub shell: Option<String>,
    /// 输出或响应体需要匹配的正则表达式
    #[serde(default, rename = "match")]
    pub pattern: Option<String>,
    /// 期望的HTTP状态码
    #[serde(default = "default_expected_status", alias = "return")]
    pub expected_status: u16,
    /// 每轮最多尝试次数
    #[serde(default = "default_tries")]
    pub tries: u32,
    /// 同一轮内两次尝试之间的间隔（秒）
    #[serde(default, alias = "sleep")]
    pub retry_delay: u64,
    /// 两轮检查之间的间隔（秒）
    #[serde(default = "default_interval", alias = "repeat")]
    pub interval: u64,
    /// 状态变化时的邮件收件人
    #[serde(default, alias = "notify_address")]
    pub notify: Option<String>,
    /// 状态变化时执行的外部命令
    #[serde(default, alias = "alert_command")]
    pub alert: Option<String>,
}

/// 检查目标
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckTarget {
    /// HTTP GET 检查
    Web(String),
    /// Shell 命令检查
    Shell(String),
}

impl CheckDefinition {
    /// 创建Web检查
    pub fn web(url: impl Into<String>) -> Self {
        Self {
            web: Some(url.into()),
            ..Self::with_defaults()
        }
    }

    /// 创建Shell检查
    pub fn shell(command: impl Into<String>) -> Self {
        Self {
            shell: Some(command.into()),
            ..Self::with_defaults()
        }
    }

    fn with_defaults() -> Self {
        Self {
            expected_status: default_expected_status(),
            tries: default_tries(),
            interval: default_interval(),
            ..Default::default()
        }
    }

    /// 校验并返回检查目标
    ///
    /// web 与 shell 必须且只能设置一个，空字符串视为未设置
    pub fn target(&self) -> Result<CheckTarget, ConfigError> {
        match (non_empty(&self.web), non_empty(&self.shell)) {
            (Some(url), None) => Ok(CheckTarget::Web(url.to_string())),
            (None, Some(command)) => Ok(CheckTarget::Shell(command.to_string())),
            (None, None) => Err(ConfigError::MissingTarget),
            (Some(_), Some(_)) => Err(ConfigError::ConflictingTarget),
        }
    }

    /// 显示名称
    pub fn display_name(&self) -> &str {
        non_empty(&self.name)
            .or_else(|| non_empty(&self.web))
            .or_else(|| non_empty(&self.shell))
            .unwrap_or_default()
    }

    /// 匹配用的正则表达式（未设置时为 None）
    pub fn match_pattern(&self) -> Option<&str> {
        non_empty(&self.pattern)
    }

    /// 邮件收件人
    pub fn notify_address(&self) -> Option<&str> {
        non_empty(&self.notify)
    }

    /// 外部告警命令
    pub fn alert_command(&self) -> Option<&str> {
        non_empty(&self.alert)
    }

    /// 期望的状态码，0 视为未设置
    pub fn expected_code(&self) -> u16 {
        if self.expected_status == 0 {
            default_expected_status()
        } else {
            self.expected_status
        }
    }

    /// 每轮尝试次数，至少为1
    pub fn attempts(&self) -> u32 {
        self.tries.max(1)
    }

    /// 重试间隔
    pub fn retry_pause(&self) -> Duration {
        Duration::from_secs(self.retry_delay)
    }

    /// 轮询间隔，0 视为未设置
    pub fn poll_interval(&self) -> Duration {
        if self.interval == 0 {
            Duration::from_secs(default_interval())
        } else {
            Duration::from_secs(self.interval)
        }
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|s| !s.is_empty())
}

/// HTTP监听配置，来自 HOST 与 PORT 环境变量
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListenerConfig {
    /// 监听地址
    pub host: String,
    /// 监听端口
    pub port: u16,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 3000,
        }
    }
}

impl ListenerConfig {
    /// 从环境变量读取监听配置
    ///
    /// PORT 无法解析属于监听失败，而不是配置文件错误
    pub fn from_env() -> Result<Self, ServerError> {
        let mut config = Self::default();

        if let Some(host) = std::env::var("HOST").ok().filter(|h| !h.is_empty()) {
            config.host = host;
        }

        if let Some(port) = std::env::var("PORT").ok().filter(|p| !p.is_empty()) {
            config.port = port
                .parse()
                .map_err(|_| ServerError::Listener(format!("PORT={port} 不是有效端口")))?;
        }

        Ok(config)
    }

    /// 监听地址字符串
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

// 默认值函数
fn default_request_timeout() -> u64 {
    30
}
fn default_expected_status() -> u16 {
    200
}
fn default_tries() -> u32 {
    1
}
fn default_interval() -> u64 {
    30
}
