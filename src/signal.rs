//! 信号处理模块
//!
//! SIGINT/SIGTERM 触发正常退出（退出码 0）

use tracing::info;

#[cfg(unix)]
use signal_hook::consts::{SIGINT, SIGTERM};
#[cfg(unix)]
use signal_hook_tokio::Signals;

/// 已注册的退出信号
pub struct ShutdownSignals {
    #[cfg(unix)]
    signals: Signals,
}

impl ShutdownSignals {
    /// 注册信号处理器
    ///
    /// 注册是同步完成的，返回后到达的信号都不会再触发默认行为
    pub fn register() -> std::io::Result<Self> {
        #[cfg(unix)]
        {
            Ok(Self {
                signals: Signals::new([SIGINT, SIGTERM])?,
            })
        }
        #[cfg(not(unix))]
        {
            Ok(Self {})
        }
    }

    /// 等待第一个退出信号，返回信号名称
    #[cfg(unix)]
    pub async fn wait(self) -> &'static str {
        use futures::stream::StreamExt;

        let handle = self.signals.handle();
        let mut signals = self.signals;
        let name = match signals.next().await {
            Some(SIGINT) => "SIGINT",
            Some(SIGTERM) => "SIGTERM",
            Some(_) | None => "unknown",
        };
        handle.close();

        info!("接收到 {} 信号，退出", name);
        name
    }

    /// 等待 Ctrl+C
    #[cfg(not(unix))]
    pub async fn wait(self) -> &'static str {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("监听 Ctrl+C 失败: {e}");
        }
        info!("接收到 Ctrl+C，退出");
        "ctrl_c"
    }
}
