//! jsonmon - 轻量级服务健康监控
//!
//! 按固定间隔执行 Shell 命令或 HTTP GET 检查，支持：
//! - 单轮内的重试
//! - 状态变化时的日志、邮件与外部命令通知
//! - 带 ETag 条件请求的 JSON 状态接口

pub mod cli;
pub mod config;
pub mod error;
pub mod health;
pub mod logging;
pub mod notification;
pub mod service;
pub mod signal;
pub mod status;
pub mod version;
pub mod web;

// 重新导出主要类型
pub use config::{CheckDefinition, Config};
pub use error::JsonmonError;
pub use status::StatusCache;

/// 应用程序版本信息
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// 应用程序名称
pub const APP_NAME: &str = env!("CARGO_PKG_NAME");

/// 应用程序描述
pub const APP_DESCRIPTION: &str = env!("CARGO_PKG_DESCRIPTION");
