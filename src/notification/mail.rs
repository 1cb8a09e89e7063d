//! 邮件通知
//!
//! 使用 handlebars 模板生成纯文本邮件，并交给 sendmail 投递

use crate::error::NotificationError;
use crate::notification::Mailer;
use async_trait::async_trait;
use handlebars::Handlebars;
use serde::Serialize;
use std::path::PathBuf;
use std::process::Stdio;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::debug;

/// 默认的 sendmail 路径
pub const SENDMAIL_PATH: &str = "/usr/sbin/sendmail";

/// 邮件模板
const MAIL_TEMPLATE: &str =
    "To: {{to}}\nSubject: {{subject}}\nX-Mailer: jsonmon\n\n{{#if body}}{{body}}{{/if}}\n.\n";

/// 邮件消息
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MailMessage {
    /// 收件人
    pub to: String,
    /// 标题
    pub subject: String,
    /// 正文
    pub body: Option<String>,
}

impl MailMessage {
    /// 创建新的邮件消息
    pub fn new(to: impl Into<String>, subject: impl Into<String>, body: Option<String>) -> Self {
        Self {
            to: header_value(to.into()),
            subject: header_value(subject.into()),
            body,
        }
    }

    /// 渲染为 sendmail -t 可接受的邮件文本
    pub fn render(&self) -> Result<String, NotificationError> {
        let mut handlebars = Handlebars::new();
        handlebars.register_escape_fn(handlebars::no_escape);
        handlebars
            .render_template(MAIL_TEMPLATE, self)
            .map_err(|e| NotificationError::Template(e.to_string()))
    }
}

/// 邮件头不能包含换行
fn header_value(value: String) -> String {
    if value.contains(['\r', '\n']) {
        value.replace(['\r', '\n'], " ")
    } else {
        value
    }
}

/// 基于 sendmail 的邮件发送器
#[derive(Debug, Clone)]
pub struct SendmailMailer {
    /// sendmail 程序路径
    program: PathBuf,
}

impl SendmailMailer {
    /// 创建新的发送器
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl Default for SendmailMailer {
    fn default() -> Self {
        Self::new(SENDMAIL_PATH)
    }
}

#[async_trait]
impl Mailer for SendmailMailer {
    async fn send(&self, message: &MailMessage) -> Result<(), NotificationError> {
        let program = self.program.display().to_string();
        let content = message.render()?;

        let mut child = Command::new(&self.program)
            .arg("-t")
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| NotificationError::Spawn {
                program: program.clone(),
                source,
            })?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin
                .write_all(content.as_bytes())
                .await
                .map_err(|source| NotificationError::Write {
                    program: program.clone(),
                    source,
                })?;
        }

        let output = child
            .wait_with_output()
            .await
            .map_err(|source| NotificationError::Spawn {
                program: program.clone(),
                source,
            })?;

        if !output.status.success() {
            let mut combined = String::from_utf8_lossy(&output.stdout).into_owned();
            combined.push_str(&String::from_utf8_lossy(&output.stderr));
            return Err(NotificationError::Exit {
                program,
                status: output.status.to_string(),
                output: combined,
            });
        }

        debug!("邮件已提交给 {}: {}", program, message.to);
        Ok(())
    }
}
