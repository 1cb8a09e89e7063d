//! 通知模块
//!
//! 只在检查项状态变化时触发：日志、邮件、外部告警命令。
//! 所有通知都是尽力而为，失败只记录日志，不影响检查状态。

pub mod alert;
pub mod mail;

use crate::config::CheckDefinition;
use crate::error::NotificationError;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{error, info, warn};

// 重新导出主要类型
pub use alert::CommandAlertRunner;
pub use mail::{MailMessage, SendmailMailer};

/// 一次状态变化
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    /// 检查项显示名称
    pub name: String,
    /// 变化后是否失败
    pub failed: bool,
    /// 失败时的诊断信息（恢复时为空）
    pub diagnostic: Option<String>,
}

impl Transition {
    /// 转为失败
    pub fn failed(name: impl Into<String>, diagnostic: Option<String>) -> Self {
        Self {
            name: name.into(),
            failed: true,
            diagnostic,
        }
    }

    /// 恢复正常
    pub fn fixed(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            failed: false,
            diagnostic: None,
        }
    }

    /// 通知标题
    pub fn subject(&self) -> String {
        if self.failed {
            format!("Failed: {}", self.name)
        } else {
            format!("Fixed: {}", self.name)
        }
    }
}

/// 邮件发送接口
#[async_trait]
pub trait Mailer: Send + Sync {
    /// 发送一封纯文本邮件
    async fn send(&self, message: &MailMessage) -> Result<(), NotificationError>;
}

/// 外部告警命令接口
#[async_trait]
pub trait AlertRunner: Send + Sync {
    /// 以 `(是否失败, 名称, [诊断])` 为参数执行告警命令
    async fn run(&self, command: &str, transition: &Transition) -> Result<(), NotificationError>;
}

/// 通知分发器
#[derive(Clone)]
pub struct NotificationDispatcher {
    /// 邮件发送器
    mailer: Arc<dyn Mailer>,
    /// 告警命令执行器
    alerter: Arc<dyn AlertRunner>,
}

impl NotificationDispatcher {
    /// 创建新的通知分发器
    pub fn new(mailer: Arc<dyn Mailer>, alerter: Arc<dyn AlertRunner>) -> Self {
        Self { mailer, alerter }
    }

    /// 使用系统 sendmail 和外部命令的分发器
    pub fn system() -> Self {
        Self::new(
            Arc::new(SendmailMailer::default()),
            Arc::new(CommandAlertRunner::new()),
        )
    }

    /// 分发一次状态变化
    pub async fn dispatch(&self, definition: &CheckDefinition, transition: &Transition) {
        let subject = transition.subject();

        match &transition.diagnostic {
            Some(diagnostic) if transition.failed => warn!("{}\n{}", subject, diagnostic),
            _ if transition.failed => warn!("{}", subject),
            _ => info!("{}", subject),
        }

        if let Some(address) = definition.notify_address() {
            let message = MailMessage::new(address, subject, transition.diagnostic.clone());
            if let Err(e) = self.mailer.send(&message).await {
                error!("邮件通知发送失败 ({}): {}", address, e);
            }
        }

        if let Some(command) = definition.alert_command() {
            if let Err(e) = self.alerter.run(command, transition).await {
                error!("告警命令执行失败: {}", e);
            }
        }
    }
}
