//! 日志系统模块
//!
//! 基于 tracing 的结构化日志，输出到标准错误。
//! `log` crate 的记录通过 LogTracer 桥接到 tracing。

use log::LevelFilter;
use std::collections::HashMap;
use std::sync::{Mutex, OnceLock};
use tracing_subscriber::filter::{Directive, LevelFilter as TracingLevel};
use tracing_subscriber::{fmt, prelude::*, registry, EnvFilter, Layer};

/// 全局日志初始化结果，成功时保存实际生效的配置
static INIT_RESULT: OnceLock<Mutex<Option<Result<LogConfig, String>>>> = OnceLock::new();

/// 日志配置结构
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// 日志级别
    pub level: LevelFilter,
    /// 是否使用JSON格式
    pub json_format: bool,
    /// 模块级别日志控制
    pub module_levels: HashMap<String, LevelFilter>,
}

impl Default for LogConfig {
    fn default() -> Self {
        let mut module_levels = HashMap::new();
        // 第三方网络库的调试日志过于冗长
        module_levels.insert("hyper".to_string(), LevelFilter::Warn);
        module_levels.insert("hyper_util".to_string(), LevelFilter::Warn);
        module_levels.insert("reqwest".to_string(), LevelFilter::Warn);

        Self {
            level: LevelFilter::Info,
            json_format: false,
            module_levels,
        }
    }
}

impl LogConfig {
    /// 指定级别的默认配置
    pub fn with_level(level: LevelFilter) -> Self {
        Self {
            level,
            ..Self::default()
        }
    }
}

/// 日志系统
#[derive(Debug)]
pub struct LoggingSystem {
    /// 配置
    config: LogConfig,
}

impl LoggingSystem {
    /// 初始化日志系统
    ///
    /// 进程内只会真正初始化一次，之后的调用返回第一次的结果和当时生效的配置
    pub fn setup_logging(config: LogConfig) -> anyhow::Result<Self> {
        let state = INIT_RESULT.get_or_init(|| Mutex::new(None));
        let mut state = state
            .lock()
            .map_err(|_| anyhow::anyhow!("日志系统状态锁已损坏"))?;

        let result = state.get_or_insert_with(|| {
            Self::perform_initialization(&config)
                .map(|()| config)
                .map_err(|e| e.to_string())
        });

        match result {
            Ok(config) => Ok(Self {
                config: config.clone(),
            }),
            Err(e) => Err(anyhow::anyhow!("日志系统初始化失败: {}", e)),
        }
    }

    /// 实际生效的日志配置
    pub fn config(&self) -> &LogConfig {
        &self.config
    }

    /// 执行实际的日志系统初始化
    ///
    /// LogTracer 已经接管 `log` 记录，subscriber 只能通过 `set_global_default` 安装
    fn perform_initialization(config: &LogConfig) -> anyhow::Result<()> {
        tracing_log::LogTracer::init().map_err(|e| anyhow::anyhow!("LogTracer初始化失败: {}", e))?;

        let subscriber = registry()
            .with(Self::build_filter(config))
            .with(Self::build_fmt_layer(config));
        tracing::subscriber::set_global_default(subscriber)
            .map_err(|e| anyhow::anyhow!("tracing subscriber初始化失败: {}", e))?;

        tracing::debug!("日志配置: {:?}", config);
        Ok(())
    }

    /// 构建过滤器：环境变量 RUST_LOG 优先，其次为配置的级别
    fn build_filter(config: &LogConfig) -> EnvFilter {
        let mut env_filter = EnvFilter::from_default_env()
            .add_directive(Self::convert_level_to_directive(config.level));

        for (module, level) in &config.module_levels {
            match format!("{}={}", module, Self::level_to_string(*level)).parse::<Directive>() {
                Ok(directive) => env_filter = env_filter.add_directive(directive),
                Err(e) => eprintln!("忽略无效的日志过滤规则 {module}: {e}"),
            }
        }

        env_filter
    }

    /// 构建格式化层
    fn build_fmt_layer<S>(config: &LogConfig) -> Box<dyn Layer<S> + Send + Sync>
    where
        S: tracing::Subscriber + for<'a> tracing_subscriber::registry::LookupSpan<'a>,
    {
        if config.json_format {
            fmt::layer()
                .json()
                .with_writer(std::io::stderr)
                .with_timer(fmt::time::ChronoUtc::rfc_3339())
                .boxed()
        } else {
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_timer(fmt::time::ChronoUtc::rfc_3339())
                .with_target(false)
                .boxed()
        }
    }

    /// 将 log::LevelFilter 转换为 tracing 的指令
    fn convert_level_to_directive(level: LevelFilter) -> Directive {
        let level = match level {
            LevelFilter::Off => TracingLevel::OFF,
            LevelFilter::Error => TracingLevel::ERROR,
            LevelFilter::Warn => TracingLevel::WARN,
            LevelFilter::Info => TracingLevel::INFO,
            LevelFilter::Debug => TracingLevel::DEBUG,
            LevelFilter::Trace => TracingLevel::TRACE,
        };
        Directive::from(level)
    }

    /// 将 log::LevelFilter 转换为字符串
    fn level_to_string(level: LevelFilter) -> &'static str {
        match level {
            LevelFilter::Off => "off",
            LevelFilter::Error => "error",
            LevelFilter::Warn => "warn",
            LevelFilter::Info => "info",
            LevelFilter::Debug => "debug",
            LevelFilter::Trace => "trace",
        }
    }
}
