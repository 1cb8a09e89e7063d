//! 状态缓存模块
//!
//! 保存所有检查项的当前状态以及全局变更标记（用作HTTP ETag）。
//! 写入方只有各检查项自己的 worker，且只在状态变化时加写锁；
//! HTTP 处理函数以读锁访问并在读锁内完成序列化。

use crate::config::CheckDefinition;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;
use tokio::sync::RwLock;
use tracing::error;

/// 单个检查项在状态接口中的输出
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct CheckStatus {
    /// 显示名称
    #[serde(skip_serializing_if = "String::is_empty")]
    pub name: String,
    /// HTTP检查地址
    #[serde(skip_serializing_if = "Option::is_none")]
    pub web: Option<String>,
    /// Shell检查命令
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shell: Option<String>,
    /// 当前是否失败
    pub failed: bool,
    /// 最近一次状态变化的时间（RFC 3339）
    #[serde(skip_serializing_if = "Option::is_none")]
    pub since: Option<String>,
}

impl CheckStatus {
    /// 由检查项定义构建初始状态
    ///
    /// 目标无效的检查项从一开始就是失败状态，且永远不会被轮询
    pub fn from_definition(definition: &CheckDefinition) -> Self {
        let keep = |value: &Option<String>| value.clone().filter(|s| !s.is_empty());
        Self {
            name: definition.display_name().to_string(),
            web: keep(&definition.web),
            shell: keep(&definition.shell),
            failed: definition.target().is_err(),
            since: None,
        }
    }
}

/// 状态快照
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusSnapshot {
    /// 按配置顺序排列的检查项
    pub checks: Vec<CheckStatus>,
    /// 快照对应的变更标记
    pub change_token: String,
}

/// 条件请求的结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Conditional {
    /// 客户端持有的标记仍然有效
    NotModified,
    /// 内容已变化，附带新的标记和JSON内容
    Modified { etag: String, body: Vec<u8> },
}

/// 状态变化
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateChange {
    /// 变化后是否失败
    pub failed: bool,
    /// 变化时间
    pub since: String,
    /// 新的变更标记
    pub change_token: String,
}

#[derive(Debug)]
struct CacheState {
    checks: Vec<CheckStatus>,
    change_token: String,
    last_stamp: i64,
}

/// 状态缓存
#[derive(Debug)]
pub struct StatusCache {
    state: RwLock<CacheState>,
    started: String,
}

impl StatusCache {
    /// 由检查项定义创建状态缓存
    pub fn new(definitions: &[CheckDefinition]) -> Self {
        let stamp = timestamp_nanos(Utc::now());
        let started = etag(stamp);

        Self {
            state: RwLock::new(CacheState {
                checks: definitions.iter().map(CheckStatus::from_definition).collect(),
                change_token: started.clone(),
                last_stamp: stamp,
            }),
            started,
        }
    }

    /// 进程启动标记，用作 /version 的 ETag
    pub fn started_token(&self) -> &str {
        &self.started
    }

    /// 当前变更标记
    pub async fn change_token(&self) -> String {
        self.state.read().await.change_token.clone()
    }

    /// 获取全部检查项的快照
    pub async fn snapshot(&self) -> StatusSnapshot {
        let state = self.state.read().await;
        StatusSnapshot {
            checks: state.checks.clone(),
            change_token: state.change_token.clone(),
        }
    }

    /// 获取单个检查项的状态
    pub async fn check(&self, index: usize) -> Option<CheckStatus> {
        self.state.read().await.checks.get(index).cloned()
    }

    /// 按条件请求渲染状态JSON
    ///
    /// `known` 与当前标记完全相同时返回 [`Conditional::NotModified`]，
    /// 否则在读锁内序列化当前状态
    pub async fn render_if_modified(&self, known: Option<&str>) -> serde_json::Result<Conditional> {
        let state = self.state.read().await;

        if known == Some(state.change_token.as_str()) {
            return Ok(Conditional::NotModified);
        }

        let body = serde_json::to_vec(&state.checks)?;
        Ok(Conditional::Modified {
            etag: state.change_token.clone(),
            body,
        })
    }

    /// 记录一次状态变化
    ///
    /// 在写锁内同时更新 failed、since 和全局变更标记。
    /// 若新状态与当前状态相同则不做任何修改并返回 `None`。
    pub async fn record_transition(
        &self,
        index: usize,
        failed: bool,
        at: DateTime<Utc>,
    ) -> Option<StateChange> {
        let mut state = self.state.write().await;

        let stamp = timestamp_nanos(at).max(state.last_stamp + 1);
        let check = match state.checks.get_mut(index) {
            Some(check) => check,
            None => {
                error!("状态缓存中不存在检查项: {}", index);
                return None;
            }
        };
        if check.failed == failed {
            return None;
        }

        let since = at.to_rfc3339_opts(SecondsFormat::Secs, true);
        check.failed = failed;
        check.since = Some(since.clone());

        state.last_stamp = stamp;
        state.change_token = etag(stamp);

        Some(StateChange {
            failed,
            since,
            change_token: state.change_token.clone(),
        })
    }
}

fn timestamp_nanos(at: DateTime<Utc>) -> i64 {
    at.timestamp_nanos_opt().unwrap_or(i64::MAX - 1)
}

/// 由纳秒时间戳构建弱校验器形式的标记
fn etag(stamp: i64) -> String {
    format!("W/\"{stamp}\"")
}
