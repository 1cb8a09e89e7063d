//! 重试策略
//!
//! 每轮检查最多尝试 `tries` 次，遇到第一次成功即停止

use crate::config::CheckDefinition;
use crate::health::probe::{Probe, ProbeOutcome};
use std::time::Duration;
use tracing::debug;

/// 重试策略
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// 最大尝试次数（至少为1）
    tries: u32,
    /// 两次尝试之间的间隔
    delay: Duration,
}

impl RetryPolicy {
    /// 创建新的重试策略
    pub fn new(tries: u32, delay: Duration) -> Self {
        Self {
            tries: tries.max(1),
            delay,
        }
    }

    /// 由检查项定义创建重试策略
    pub fn for_check(definition: &CheckDefinition) -> Self {
        Self::new(definition.attempts(), definition.retry_pause())
    }

    /// 最大尝试次数
    pub fn tries(&self) -> u32 {
        self.tries
    }

    /// 执行探测
    ///
    /// 返回最后一次尝试的结果；最后一次尝试之后不再等待
    pub async fn run(&self, probe: &dyn Probe, definition: &CheckDefinition) -> ProbeOutcome {
        let mut attempt = 1;
        loop {
            let outcome = probe.execute(definition).await;
            if outcome.success || attempt >= self.tries {
                return outcome;
            }

            debug!(
                "检查 {} 第 {}/{} 次尝试失败: {}",
                definition.display_name(),
                attempt,
                self.tries,
                outcome.diagnostic.as_deref().unwrap_or_default()
            );

            attempt += 1;
            tokio::time::sleep(self.delay).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use tokio::time::Instant;

    /// 按脚本返回结果并记录调用时间的探测器
    struct ScriptedProbe {
        outcomes: Mutex<VecDeque<ProbeOutcome>>,
        calls: Mutex<Vec<Instant>>,
    }

    impl ScriptedProbe {
        fn new(outcomes: Vec<ProbeOutcome>) -> Self {
            Self {
                outcomes: Mutex::new(outcomes.into()),
                calls: Mutex::new(Vec::new()),
            }
        }

        fn calls(&self) -> Vec<Instant> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Probe for ScriptedProbe {
        async fn execute(&self, _definition: &CheckDefinition) -> ProbeOutcome {
            self.calls.lock().unwrap().push(Instant::now());
            self.outcomes
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| ProbeOutcome::failure("script exhausted"))
        }
    }

    fn check() -> CheckDefinition {
        CheckDefinition::shell("true")
    }

    #[tokio::test(start_paused = true)]
    async fn test_success_on_last_attempt() {
        let probe = ScriptedProbe::new(vec![
            ProbeOutcome::failure("attempt 1"),
            ProbeOutcome::failure("attempt 2"),
            ProbeOutcome::success(),
        ]);
        let policy = RetryPolicy::new(3, Duration::from_secs(5));

        let start = Instant::now();
        let outcome = policy.run(&probe, &check()).await;

        assert_eq!(outcome, ProbeOutcome::success());
        assert_eq!(probe.calls().len(), 3);
        assert_eq!(start.elapsed(), Duration::from_secs(10));
    }

    #[tokio::test(start_paused = true)]
    async fn test_all_attempts_fail_reports_last() {
        let probe = ScriptedProbe::new(vec![
            ProbeOutcome::failure("attempt 1"),
            ProbeOutcome::failure("attempt 2"),
            ProbeOutcome::failure("attempt 3"),
        ]);
        let policy = RetryPolicy::new(3, Duration::from_secs(5));

        let start = Instant::now();
        let outcome = policy.run(&probe, &check()).await;

        assert!(!outcome.success);
        assert_eq!(outcome.diagnostic.as_deref(), Some("attempt 3"));
        // 三次尝试之间只有两次等待
        assert_eq!(start.elapsed(), Duration::from_secs(10));

        let calls = probe.calls();
        assert_eq!(calls.len(), 3);
        assert_eq!(calls[1] - calls[0], Duration::from_secs(5));
        assert_eq!(calls[2] - calls[1], Duration::from_secs(5));
    }

    #[tokio::test(start_paused = true)]
    async fn test_first_success_stops() {
        let probe = ScriptedProbe::new(vec![ProbeOutcome::success()]);
        let policy = RetryPolicy::new(5, Duration::from_secs(5));

        let start = Instant::now();
        assert!(policy.run(&probe, &check()).await.success);
        assert_eq!(probe.calls().len(), 1);
        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[test]
    fn test_minimum_one_try() {
        assert_eq!(RetryPolicy::new(0, Duration::ZERO).tries(), 1);

        let definition = CheckDefinition {
            tries: 4,
            retry_delay: 2,
            ..check()
        };
        assert_eq!(
            RetryPolicy::for_check(&definition),
            RetryPolicy::new(4, Duration::from_secs(2))
        );
    }
}
