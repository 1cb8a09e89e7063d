//! 配置加载器实现
//!
//! 提供TOML/JSON/YAML配置文件解析和错误处理功能。
//! 配置文本原样解析，shell 命令和 match 表达式中的 `$VAR` 由执行时的解释器处理。

use crate::config::types::{CheckDefinition, Config};
use crate::error::ConfigError;
use async_trait::async_trait;
use serde::Deserialize;
use std::path::Path;
use tracing::{debug, info};

/// 配置文件格式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    /// TOML，使用 `[[checks]]` 数组
    Toml,
    /// JSON，检查项数组或 `{"checks": [...]}`
    Json,
    /// YAML，与 JSON 相同的两种结构
    Yaml,
}

impl ConfigFormat {
    /// 根据文件扩展名推断格式，默认TOML
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => ConfigFormat::Json,
            Some(ext) if ext.eq_ignore_ascii_case("yml") || ext.eq_ignore_ascii_case("yaml") => {
                ConfigFormat::Yaml
            }
            _ => ConfigFormat::Toml,
        }
    }
}

/// 配置加载器trait，定义配置加载接口
#[async_trait]
pub trait ConfigLoader: Send + Sync {
    /// 从文件加载配置
    async fn load_from_file(&self, path: &Path) -> Result<Config, ConfigError>;

    /// 从字符串加载配置
    fn load_from_string(&self, content: &str, format: ConfigFormat)
        -> Result<Config, ConfigError>;
}

/// JSON/YAML配置可以是裸数组，也可以是完整结构
#[derive(Deserialize)]
#[serde(untagged)]
enum ChecksDocument {
    List(Vec<CheckDefinition>),
    Full(Config),
}

impl From<ChecksDocument> for Config {
    fn from(document: ChecksDocument) -> Self {
        match document {
            ChecksDocument::List(checks) => Config::from_checks(checks),
            ChecksDocument::Full(config) => config,
        }
    }
}

/// 文件配置加载器实现
#[derive(Debug, Clone, Default)]
pub struct FileConfigLoader;

impl FileConfigLoader {
    /// 创建新的配置加载器
    pub fn new() -> Self {
        Self
    }

    fn parse(&self, content: &str, format: ConfigFormat, path: &str) -> Result<Config, ConfigError> {
        let parse_error = |message: String| ConfigError::Parse {
            path: path.to_string(),
            message,
        };

        match format {
            ConfigFormat::Toml => toml::from_str(content).map_err(|e| parse_error(e.to_string())),
            ConfigFormat::Json => serde_json::from_str::<ChecksDocument>(content)
                .map(Config::from)
                .map_err(|e| parse_error(e.to_string())),
            ConfigFormat::Yaml => serde_yaml::from_str::<ChecksDocument>(content)
                .map(Config::from)
                .map_err(|e| parse_error(e.to_string())),
        }
    }
}

#[async_trait]
impl ConfigLoader for FileConfigLoader {
    async fn load_from_file(&self, path: &Path) -> Result<Config, ConfigError> {
        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| ConfigError::Read {
                path: path.display().to_string(),
                source,
            })?;

        let config = self.parse(
            &content,
            ConfigFormat::from_path(path),
            &path.display().to_string(),
        )?;

        info!("成功加载配置文件: {}，检查项数量: {}", path.display(), config.checks.len());
        debug!("配置内容: {:?}", config);

        Ok(config)
    }

    fn load_from_string(
        &self,
        content: &str,
        format: ConfigFormat,
    ) -> Result<Config, ConfigError> {
        self.parse(content, format, "<string>")
    }
}
