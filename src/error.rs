//! 错误处理模块
//!
//! 定义应用程序的统一错误类型以及对应的进程退出码

use thiserror::Error;

/// 参数错误的退出码
pub const EXIT_USAGE: i32 = 1;
/// 配置错误的退出码
pub const EXIT_CONFIG: i32 = 3;
/// HTTP监听失败的退出码
pub const EXIT_SERVER: i32 = 4;

/// jsonmon 应用程序的主要错误类型
#[derive(Error, Debug)]
pub enum JsonmonError {
    /// 命令行参数错误
    #[error("参数错误: {0}")]
    Usage(String),

    /// 配置相关错误
    #[error("配置错误: {0}")]
    Config(#[from] ConfigError),

    /// 健康检测组件初始化错误
    #[error("健康检测错误: {0}")]
    HealthCheck(#[from] HealthCheckError),

    /// HTTP服务相关错误
    #[error("HTTP服务错误: {0}")]
    Server(#[from] ServerError),
}

impl JsonmonError {
    /// 获取错误对应的进程退出码
    pub fn exit_code(&self) -> i32 {
        match self {
            JsonmonError::Usage(_) | JsonmonError::HealthCheck(_) => EXIT_USAGE,
            JsonmonError::Config(_) => EXIT_CONFIG,
            JsonmonError::Server(_) => EXIT_SERVER,
        }
    }
}

/// 配置错误类型
#[derive(Error, Debug)]
pub enum ConfigError {
    /// 配置文件无法读取
    #[error("无法读取配置文件 {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// 配置文件解析错误
    #[error("配置文件 {path} 格式无效: {message}")]
    Parse { path: String, message: String },

    /// 检查项既没有 web 也没有 shell
    #[error("检查项缺少 web 或 shell 目标")]
    MissingTarget,

    /// 检查项同时配置了 web 和 shell
    #[error("同一检查项不允许同时配置 web 和 shell")]
    ConflictingTarget,
}

/// 健康检测错误类型
#[derive(Error, Debug)]
pub enum HealthCheckError {
    /// HTTP客户端创建失败
    #[error("HTTP客户端创建失败: {0}")]
    Client(#[source] reqwest::Error),
}

/// 通知错误类型
#[derive(Error, Debug)]
pub enum NotificationError {
    /// 进程启动失败
    #[error("无法启动 {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// 写入邮件内容失败
    #[error("写入 {program} 失败: {source}")]
    Write {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// 进程以非零状态退出
    #[error("{program} 执行失败 ({status}): {output}")]
    Exit {
        program: String,
        status: String,
        output: String,
    },

    /// 模板渲染错误
    #[error("模板渲染失败: {0}")]
    Template(String),
}

/// HTTP服务错误类型
#[derive(Error, Debug)]
pub enum ServerError {
    /// 监听配置无效（如 PORT 不是端口号）
    #[error("无效的监听配置: {0}")]
    Listener(String),

    /// 监听端口失败
    #[error("无法监听 {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    /// 服务运行中断
    #[error("HTTP服务异常退出: {0}")]
    Serve(#[source] std::io::Error),

    /// 信号处理器注册失败
    #[error("无法注册信号处理器: {0}")]
    Signal(#[source] std::io::Error),
}

/// 结果类型别名
pub type Result<T> = std::result::Result<T, JsonmonError>;
