//! 命令行参数定义
//!
//! 使用clap定义应用程序的命令行接口：`jsonmon <config>`

use clap::{ArgAction, Parser, ValueEnum};
use std::ffi::OsString;
use std::path::PathBuf;

/// 帮助信息末尾的补充说明
const AFTER_HELP: &str = "\
Environment:
  HOST   监听地址 (默认: localhost)
  PORT   监听端口 (默认: 3000)

配置文件格式见 https://github.com/chillum/jsonmon/wiki";

/// jsonmon - 轻量级服务健康监控
#[derive(Parser, Debug, Clone)]
#[command(
    name = "jsonmon",
    about = crate::APP_DESCRIPTION,
    long_about = None,
    disable_version_flag = true,
    after_help = AFTER_HELP
)]
pub struct Args {
    /// 配置文件路径
    #[arg(
        value_name = "CONFIG",
        help = "配置文件路径 (.toml 或 .json)",
        required_unless_present = "version"
    )]
    pub config: Option<PathBuf>,

    /// 打印版本信息
    #[arg(
        short = 'v',
        long,
        action = ArgAction::SetTrue,
        conflicts_with = "config",
        help = "以JSON格式打印版本信息"
    )]
    pub version: bool,

    /// 日志级别
    #[arg(
        long,
        value_enum,
        default_value = "info",
        help = "日志级别",
        env = "JSONMON_LOG_LEVEL"
    )]
    pub log_level: LogLevel,

    /// 是否输出JSON格式日志
    #[arg(long, help = "输出JSON格式日志", env = "JSONMON_LOG_JSON")]
    pub log_json: bool,
}

/// 日志级别枚举
#[derive(ValueEnum, Clone, Debug, PartialEq)]
pub enum LogLevel {
    /// 调试级别
    Debug,
    /// 信息级别
    Info,
    /// 警告级别
    Warn,
    /// 错误级别
    Error,
}

impl From<LogLevel> for log::LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Error => log::LevelFilter::Error,
        }
    }
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LogLevel::Debug => write!(f, "debug"),
            LogLevel::Info => write!(f, "info"),
            LogLevel::Warn => write!(f, "warn"),
            LogLevel::Error => write!(f, "error"),
        }
    }
}

impl Args {
    /// 解析进程命令行参数
    pub fn try_parse_args() -> Result<Self, clap::Error> {
        Self::try_parse_args_from(std::env::args_os())
    }

    /// 解析给定的命令行参数
    ///
    /// 兼容单横线的长选项写法 `-version` 与 `-help`
    pub fn try_parse_args_from<I, T>(args: I) -> Result<Self, clap::Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString>,
    {
        let args = args.into_iter().map(|arg| {
            let arg = arg.into();
            match arg.to_str() {
                Some("-version") => OsString::from("--version"),
                Some("-help") => OsString::from("--help"),
                _ => arg,
            }
        });
        Self::try_parse_from(args)
    }
}
