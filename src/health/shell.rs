//! Shell 探测器
//!
//! 通过命令解释器执行检查命令，并合并标准输出与标准错误

use crate::config::CheckDefinition;
use crate::health::probe::{verify_match, Probe, ProbeOutcome};
use async_trait::async_trait;
use tokio::process::Command;
use tracing::debug;

/// 命令解释器路径
#[cfg(unix)]
pub const SHELL_PATH: &str = "/bin/sh";
#[cfg(windows)]
pub const SHELL_PATH: &str = "cmd";

#[cfg(unix)]
const SHELL_FLAG: &str = "-c";
#[cfg(windows)]
const SHELL_FLAG: &str = "/C";

/// Shell 探测器
#[derive(Debug, Clone, Default)]
pub struct ShellProbe;

impl ShellProbe {
    /// 创建新的 Shell 探测器
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Probe for ShellProbe {
    async fn execute(&self, definition: &CheckDefinition) -> ProbeOutcome {
        let Some(command) = definition.shell.as_deref().filter(|c| !c.is_empty()) else {
            return ProbeOutcome::failure("no shell command configured");
        };

        debug!("执行Shell检查: {}", command);

        let output = match Command::new(SHELL_PATH)
            .arg(SHELL_FLAG)
            .arg(command)
            .kill_on_drop(true)
            .output()
            .await
        {
            Ok(output) => output,
            Err(e) => return ProbeOutcome::failure(e.to_string()),
        };

        let mut combined = String::from_utf8_lossy(&output.stdout).into_owned();
        combined.push_str(&String::from_utf8_lossy(&output.stderr));

        if !output.status.success() {
            return ProbeOutcome::failure(format!("{combined}{}", output.status));
        }

        match verify_match(definition.match_pattern(), &combined) {
            Ok(()) => ProbeOutcome::success(),
            Err(diagnostic) => ProbeOutcome::failure(diagnostic),
        }
    }
}
