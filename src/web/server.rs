//! Web服务器实现

use super::{build_router, WebAppState};
use crate::config::ListenerConfig;
use crate::error::ServerError;
use axum::Router;
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tracing::info;

/// Web服务器
pub struct WebServer {
    /// 已绑定的监听器
    listener: TcpListener,
    /// 路由
    router: Router,
}

impl WebServer {
    /// 绑定监听地址
    ///
    /// 绑定失败时返回 [`ServerError::Bind`]
    pub async fn bind(config: &ListenerConfig, state: WebAppState) -> Result<Self, ServerError> {
        let addr = config.address();
        let listener = TcpListener::bind(&addr)
            .await
            .map_err(|source| ServerError::Bind { addr, source })?;

        Ok(Self {
            listener,
            router: build_router(state),
        })
    }

    /// 实际监听的地址
    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// 开始处理请求，直到进程退出
    pub async fn run(self) -> Result<(), ServerError> {
        if let Ok(addr) = self.local_addr() {
            info!("Web服务器监听地址: http://{}", addr);
        }
        axum::serve(self.listener, self.router)
            .await
            .map_err(ServerError::Serve)
    }
}
