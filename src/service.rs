//! 服务启动模块
//!
//! 负责加载配置、组装各组件并运行到收到退出信号

use crate::config::{CheckDefinition, Config, ConfigLoader, FileConfigLoader, ListenerConfig};
use crate::error::{Result, ServerError};
use crate::health::{spawn_workers, ProbeSet, WebProbe};
use crate::notification::NotificationDispatcher;
use crate::signal::ShutdownSignals;
use crate::status::StatusCache;
use crate::version::VersionInfo;
use crate::web::{WebAppState, WebServer};
use std::path::Path;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{error, info};

/// 服务组件
pub struct ServiceComponents {
    /// 共享状态缓存
    pub cache: Arc<StatusCache>,
    /// 检查任务句柄
    pub workers: Vec<JoinHandle<()>>,
}

impl ServiceComponents {
    /// 停止所有检查任务
    pub fn abort(&self) {
        for worker in &self.workers {
            worker.abort();
        }
    }
}

/// 服务启动器
pub struct ServiceLauncher;

impl ServiceLauncher {
    /// 加载配置文件
    pub async fn load_config(path: &Path) -> Result<Config> {
        info!("加载配置文件: {}", path.display());

        let config = FileConfigLoader::default().load_from_file(path).await?;

        info!("配置加载成功，共 {} 个检查项", config.checks.len());
        Ok(config)
    }

    /// 使用给定的探测器与通知分发器启动检查任务
    pub fn start_checks(
        checks: &[CheckDefinition],
        probes: &ProbeSet,
        dispatcher: &NotificationDispatcher,
    ) -> ServiceComponents {
        let cache = Arc::new(StatusCache::new(checks));
        let workers = spawn_workers(checks, Arc::clone(&cache), probes, dispatcher);
        ServiceComponents { cache, workers }
    }

    /// 使用系统 shell、HTTP 客户端与 sendmail 初始化服务组件
    pub fn initialize_service_components(config: &Config) -> Result<ServiceComponents> {
        let probes = ProbeSet::system(WebProbe::new(config.request_timeout())?);
        let dispatcher = NotificationDispatcher::system();
        Ok(Self::start_checks(&config.checks, &probes, &dispatcher))
    }

    /// 运行服务，直到收到 SIGINT/SIGTERM
    ///
    /// 配置错误、监听失败等启动阶段的错误会原样返回，由调用方映射为退出码
    pub async fn run(config_path: &Path) -> Result<()> {
        let config = Self::load_config(config_path).await?;
        let listener = ListenerConfig::from_env()?;
        let signals = ShutdownSignals::register().map_err(ServerError::Signal)?;

        let components = Self::initialize_service_components(&config)?;
        let state = WebAppState::new(Arc::clone(&components.cache), VersionInfo::current());
        let server = WebServer::bind(&listener, state).await?;

        let result = tokio::select! {
            result = server.run() => {
                if let Err(e) = &result {
                    error!("Web服务器运行失败: {}", e);
                }
                result.map_err(Into::into)
            }
            _ = signals.wait() => Ok(()),
        };

        components.abort();
        result
    }
}
