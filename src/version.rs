//! 版本信息

use serde::Serialize;

/// `/version` 接口和 `--version` 输出的内容
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct VersionInfo {
    /// 应用版本
    #[serde(rename = "jsonmon")]
    pub app: String,
    /// 编译所用的运行时版本
    pub runtime: String,
    /// 操作系统
    pub os: String,
    /// CPU架构
    pub arch: String,
}

impl VersionInfo {
    /// 当前进程的版本信息
    pub fn current() -> Self {
        Self {
            app: crate::VERSION.to_string(),
            runtime: format!("rust{}", env!("CARGO_PKG_RUST_VERSION")),
            os: std::env::consts::OS.to_string(),
            arch: std::env::consts::ARCH.to_string(),
        }
    }

    /// JSON 格式的版本信息
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}
