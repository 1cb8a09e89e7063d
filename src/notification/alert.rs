//! 外部告警命令
//!
//! 状态变化时执行用户配置的命令，参数为 `true|false`、检查项名称和可选的诊断信息

use crate::error::NotificationError;
use crate::notification::{AlertRunner, Transition};
use async_trait::async_trait;
use tokio::process::Command;
use tracing::debug;

/// 执行外部命令的告警器
#[derive(Debug, Clone, Default)]
pub struct CommandAlertRunner;

impl CommandAlertRunner {
    /// 创建新的告警器
    pub fn new() -> Self {
        Self
    }

    /// 构建命令参数
    pub fn arguments(transition: &Transition) -> Vec<String> {
        let mut args = vec![transition.failed.to_string(), transition.name.clone()];
        if transition.failed {
            if let Some(diagnostic) = &transition.diagnostic {
                args.push(diagnostic.clone());
            }
        }
        args
    }
}

#[async_trait]
impl AlertRunner for CommandAlertRunner {
    async fn run(&self, command: &str, transition: &Transition) -> Result<(), NotificationError> {
        let output = Command::new(command)
            .args(Self::arguments(transition))
            .output()
            .await
            .map_err(|source| NotificationError::Spawn {
                program: command.to_string(),
                source,
            })?;

        if !output.status.success() {
            let mut combined = String::from_utf8_lossy(&output.stdout).into_owned();
            combined.push_str(&String::from_utf8_lossy(&output.stderr));
            return Err(NotificationError::Exit {
                program: command.to_string(),
                status: output.status.to_string(),
                output: combined,
            });
        }

        debug!("告警命令执行完成: {}", command);
        Ok(())
    }
}
