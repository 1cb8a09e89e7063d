//! 健康检测模块
//!
//! 提供 Shell/HTTP 探测、重试策略和每个检查项独立的检查任务

pub mod probe;
pub mod retry;
pub mod shell;
pub mod web;
pub mod worker;

// 重新导出主要类型
pub use probe::{Probe, ProbeOutcome};
pub use retry::RetryPolicy;
pub use shell::ShellProbe;
pub use web::WebProbe;
pub use worker::{spawn_workers, CheckWorker, ProbeSet};
