//! 检查任务
//!
//! 每个检查项对应一个独立的 tokio 任务，永久循环执行：
//! 探测（带重试）→ 状态变化时更新缓存 → 锁外发送通知 → 等待下一轮

use crate::config::{CheckDefinition, CheckTarget};
use crate::error::ConfigError;
use crate::health::probe::Probe;
use crate::health::retry::RetryPolicy;
use crate::health::shell::ShellProbe;
use crate::health::web::WebProbe;
use crate::notification::{NotificationDispatcher, Transition};
use crate::status::StatusCache;
use chrono::Utc;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

/// 两种探测器的集合，按检查目标选择
#[derive(Clone)]
pub struct ProbeSet {
    /// Shell 探测器
    pub shell: Arc<dyn Probe>,
    /// HTTP 探测器
    pub web: Arc<dyn Probe>,
}

impl ProbeSet {
    /// 创建探测器集合
    pub fn new(shell: Arc<dyn Probe>, web: Arc<dyn Probe>) -> Self {
        Self { shell, web }
    }

    /// 使用系统 shell 与 HTTP 客户端的探测器集合
    pub fn system(web: WebProbe) -> Self {
        Self::new(Arc::new(ShellProbe::new()), Arc::new(web))
    }

    /// 按检查目标选择探测器
    pub fn select(&self, target: &CheckTarget) -> Arc<dyn Probe> {
        match target {
            CheckTarget::Web(_) => Arc::clone(&self.web),
            CheckTarget::Shell(_) => Arc::clone(&self.shell),
        }
    }
}

/// 单个检查项的执行任务
pub struct CheckWorker {
    /// 检查项在状态缓存中的位置
    index: usize,
    /// 检查项定义
    definition: CheckDefinition,
    /// 选定的探测器
    probe: Arc<dyn Probe>,
    /// 重试策略
    retry: RetryPolicy,
    /// 共享状态缓存
    cache: Arc<StatusCache>,
    /// 通知分发器
    dispatcher: NotificationDispatcher,
    /// 当前是否失败，本任务是该检查项状态的唯一写入方
    failed: bool,
}

impl CheckWorker {
    /// 创建检查任务
    ///
    /// 检查目标无效时返回错误，该检查项不会被轮询
    pub fn new(
        index: usize,
        definition: CheckDefinition,
        probes: &ProbeSet,
        cache: Arc<StatusCache>,
        dispatcher: NotificationDispatcher,
    ) -> Result<Self, ConfigError> {
        let target = definition.target()?;
        let probe = probes.select(&target);
        let retry = RetryPolicy::for_check(&definition);

        Ok(Self {
            index,
            definition,
            probe,
            retry,
            cache,
            dispatcher,
            failed: false,
        })
    }

    /// 检查项显示名称
    pub fn name(&self) -> &str {
        self.definition.display_name()
    }

    /// 执行一轮检查
    ///
    /// 只有结论与当前状态不同时才会更新缓存并发送通知，返回该次状态变化
    pub async fn run_cycle(&mut self) -> Option<Transition> {
        let outcome = self.retry.run(self.probe.as_ref(), &self.definition).await;
        let failed = !outcome.success;

        if failed == self.failed {
            debug!("检查 {} 状态未变化 (failed={})", self.name(), failed);
            return None;
        }

        // 写锁只覆盖状态翻转、时间戳与标记刷新
        self.cache
            .record_transition(self.index, failed, Utc::now())
            .await?;
        self.failed = failed;

        let transition = if failed {
            Transition::failed(self.name(), outcome.diagnostic)
        } else {
            Transition::fixed(self.name())
        };

        self.dispatcher
            .dispatch(&self.definition, &transition)
            .await;

        Some(transition)
    }

    /// 永久循环执行检查
    pub async fn run(mut self) {
        let interval = self.definition.poll_interval();
        info!("启动检查任务: {} (间隔 {:?})", self.name(), interval);

        loop {
            self.run_cycle().await;
            tokio::time::sleep(interval).await;
        }
    }
}

/// 为每个有效的检查项启动一个独立任务
///
/// 无效的检查项在状态缓存中已是失败状态，这里只记录日志，不启动任务
pub fn spawn_workers(
    definitions: &[CheckDefinition],
    cache: Arc<StatusCache>,
    probes: &ProbeSet,
    dispatcher: &NotificationDispatcher,
) -> Vec<JoinHandle<()>> {
    let mut handles = Vec::with_capacity(definitions.len());

    for (index, definition) in definitions.iter().enumerate() {
        match CheckWorker::new(
            index,
            definition.clone(),
            probes,
            Arc::clone(&cache),
            dispatcher.clone(),
        ) {
            Ok(worker) => handles.push(tokio::spawn(worker.run())),
            Err(ConfigError::ConflictingTarget) => {
                error!("同一检查项不允许同时配置 web 和 shell，已禁用");
                error!("Disabled: {}", definition.shell.as_deref().unwrap_or_default());
                error!("Disabled: {}", definition.web.as_deref().unwrap_or_default());
            }
            Err(e) => warn!("忽略检查项 #{}: {}", index + 1, e),
        }
    }

    info!("已启动 {} 个检查任务，共 {} 个检查项", handles.len(), definitions.len());
    handles
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::health::probe::ProbeOutcome;
    use crate::notification::{AlertRunner, MailMessage, Mailer};
    use crate::error::NotificationError;
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use std::time::Duration;

    struct ScriptedProbe {
        outcomes: Mutex<VecDeque<bool>>,
        calls: AtomicUsize,
    }

    impl ScriptedProbe {
        fn new(outcomes: &[bool]) -> Arc<Self> {
            Arc::new(Self {
                outcomes: Mutex::new(outcomes.iter().copied().collect()),
                calls: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl Probe for ScriptedProbe {
        async fn execute(&self, _definition: &CheckDefinition) -> ProbeOutcome {
            let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            match self.outcomes.lock().unwrap().pop_front() {
                Some(true) | None => ProbeOutcome::success(),
                Some(false) => ProbeOutcome::failure(format!("call {call} failed")),
            }
        }
    }

    #[derive(Default)]
    struct RecordingAlerter {
        runs: Mutex<Vec<Transition>>,
    }

    #[async_trait]
    impl AlertRunner for RecordingAlerter {
        async fn run(&self, _command: &str, transition: &Transition) -> Result<(), NotificationError> {
            self.runs.lock().unwrap().push(transition.clone());
            Ok(())
        }
    }

    struct NullMailer;

    #[async_trait]
    impl Mailer for NullMailer {
        async fn send(&self, _message: &MailMessage) -> Result<(), NotificationError> {
            Ok(())
        }
    }

    fn setup(
        definition: CheckDefinition,
        probe: Arc<ScriptedProbe>,
    ) -> (CheckWorker, Arc<StatusCache>, Arc<RecordingAlerter>) {
        let definition = CheckDefinition {
            alert: Some("/bin/alert".to_string()),
            ..definition
        };
        let cache = Arc::new(StatusCache::new(std::slice::from_ref(&definition)));
        let alerter = Arc::new(RecordingAlerter::default());
        let dispatcher = NotificationDispatcher::new(Arc::new(NullMailer), alerter.clone());
        let probes = ProbeSet::new(probe.clone(), probe);
        let worker =
            CheckWorker::new(0, definition, &probes, Arc::clone(&cache), dispatcher).unwrap();
        (worker, cache, alerter)
    }

    #[tokio::test]
    async fn test_steady_success_changes_nothing() {
        let (mut worker, cache, alerter) =
            setup(CheckDefinition::shell("true"), ScriptedProbe::new(&[true; 5]));
        let token = cache.change_token().await;

        for _ in 0..5 {
            assert!(worker.run_cycle().await.is_none());
        }

        assert_eq!(cache.change_token().await, token);
        assert!(cache.check(0).await.unwrap().since.is_none());
        assert!(alerter.runs.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_transitions_are_edge_triggered() {
        let probe = ScriptedProbe::new(&[false, false, false, true, true]);
        let (mut worker, cache, alerter) = setup(CheckDefinition::shell("check"), probe);

        let down = worker.run_cycle().await.unwrap();
        assert!(down.failed);
        assert_eq!(down.diagnostic.as_deref(), Some("call 1 failed"));
        let token_after_down = cache.change_token().await;
        let since_after_down = cache.check(0).await.unwrap().since;
        assert!(since_after_down.is_some());

        assert!(worker.run_cycle().await.is_none());
        assert!(worker.run_cycle().await.is_none());
        assert_eq!(cache.change_token().await, token_after_down);
        assert_eq!(cache.check(0).await.unwrap().since, since_after_down);

        let up = worker.run_cycle().await.unwrap();
        assert_eq!(up, Transition::fixed("check"));
        assert!(!cache.check(0).await.unwrap().failed);
        assert_ne!(cache.change_token().await, token_after_down);

        assert!(worker.run_cycle().await.is_none());

        let runs = alerter.runs.lock().unwrap();
        assert_eq!(runs.len(), 2);
        assert!(runs[0].failed);
        assert!(!runs[1].failed);
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_success_hides_failures() {
        let probe = ScriptedProbe::new(&[false, false, true]);
        let definition = CheckDefinition {
            tries: 3,
            retry_delay: 1,
            ..CheckDefinition::shell("flaky")
        };
        let (mut worker, cache, alerter) = setup(definition, probe.clone());

        assert!(worker.run_cycle().await.is_none());
        assert_eq!(probe.calls.load(Ordering::SeqCst), 3);
        assert!(!cache.check(0).await.unwrap().failed);
        assert!(alerter.runs.lock().unwrap().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_sleeps_interval_between_cycles() {
        let probe = ScriptedProbe::new(&[]);
        let definition = CheckDefinition {
            interval: 10,
            ..CheckDefinition::shell("true")
        };
        let (worker, _cache, _alerter) = setup(definition, probe.clone());

        let handle = tokio::spawn(worker.run());
        tokio::time::sleep(Duration::from_secs(25)).await;
        handle.abort();

        // t=0, t=10, t=20
        assert_eq!(probe.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_invalid_definitions_are_never_polled() {
        let probe = ScriptedProbe::new(&[]);
        let probes = ProbeSet::new(probe.clone(), probe.clone());
        let definitions = vec![
            CheckDefinition::default(),
            CheckDefinition {
                shell: Some("true".to_string()),
                ..CheckDefinition::web("http://localhost/")
            },
        ];
        let cache = Arc::new(StatusCache::new(&definitions));
        let dispatcher =
            NotificationDispatcher::new(Arc::new(NullMailer), Arc::new(RecordingAlerter::default()));

        let handles = spawn_workers(&definitions, Arc::clone(&cache), &probes, &dispatcher);
        assert!(handles.is_empty());

        tokio::time::sleep(Duration::from_secs(120)).await;
        assert_eq!(probe.calls.load(Ordering::SeqCst), 0);

        let snapshot = cache.snapshot().await;
        assert!(snapshot.checks.iter().all(|check| check.failed));
    }
}
