// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use chrono::{DateTime, Utc};
use std::future::Future;
use std::time::Duration;
use tracing::warn;

/// 重试策略配置
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// 最大重试次数
    pub max_retries: u32,
    /// 初始退避时间
    pub initial_backoff: Duration,
    /// 最大退避时间
    pub max_backoff: Duration,
    /// 退避乘数
    pub backoff_multiplier: f64,
    /// 抖动因子 (0.0-1.0)
    pub jitter_factor: f64,
    /// 是否启用指数退避
    pub exponential_backoff: bool,
    /// 是否启用抖动
    pub enable_jitter: bool,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_backoff: Duration::from_secs(1),
            max_backoff: Duration::from_secs(60),
            backoff_multiplier: 2.0,
            jitter_factor: 0.1,
            exponential_backoff: true,
            enable_jitter: true,
        }
    }
}

impl RetryPolicy {
    /// 创建标准重试策略
    pub fn standard() -> Self {
        Self::default()
    }

    /// 验证任务重试策略：10s 起步指数退避，最多 3 次
    pub fn verification() -> Self {
        Self {
            max_retries: 3,
            initial_backoff: Duration::from_secs(10),
            max_backoff: Duration::from_secs(600),
            backoff_multiplier: 2.0,
            jitter_factor: 0.1,
            exponential_backoff: true,
            enable_jitter: true,
        }
    }

    /// 页面导航重试策略：短退避，适合 detached frame 之类的瞬态错误
    pub fn navigation() -> Self {
        Self {
            max_retries: 3,
            initial_backoff: Duration::from_secs(2),
            max_backoff: Duration::from_secs(30),
            backoff_multiplier: 2.0,
            jitter_factor: 0.1,
            exponential_backoff: true,
            enable_jitter: true,
        }
    }

    /// 计算下次重试的退避时间
    pub fn calculate_backoff(&self, attempt: u32) -> Duration {
        if !self.exponential_backoff {
            return self.initial_backoff;
        }

        // 计算指数退避
        let backoff_secs =
            self.initial_backoff.as_secs_f64() * self.backoff_multiplier.powi(attempt as i32 - 1);

        // 限制最大退避时间
        let capped_backoff = backoff_secs.min(self.max_backoff.as_secs_f64());

        // 添加抖动
        let final_backoff = if self.enable_jitter {
            let jitter_range = capped_backoff * self.jitter_factor;
            let jitter = rand::random_range(-jitter_range..jitter_range);
            (capped_backoff + jitter).max(0.0)
        } else {
            capped_backoff
        };

        Duration::from_secs_f64(final_backoff)
    }

    /// 计算下次重试时间
    pub fn next_retry_time(&self, attempt: u32, base_time: DateTime<Utc>) -> DateTime<Utc> {
        let backoff = self.calculate_backoff(attempt);
        base_time + chrono::Duration::milliseconds(backoff.as_millis() as i64)
    }

    /// 是否应该重试
    pub fn should_retry(&self, attempt: u32) -> bool {
        attempt < self.max_retries
    }
}

/// 按策略重试异步操作
///
/// `is_transient` 判定错误是否值得重试；非瞬态错误立即返回。
/// 每次重试前按策略退避，重试耗尽后返回最后一次的错误。
pub async fn with_retries<T, E, F, Fut>(
    policy: &RetryPolicy,
    op_name: &str,
    is_transient: impl Fn(&E) -> bool,
    mut operation: F,
) -> Result<T, E>
where
    E: std::fmt::Display,
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let mut attempt = 0u32;
    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(err) => {
                attempt += 1;
                if !is_transient(&err) || !policy.should_retry(attempt) {
                    return Err(err);
                }
                let backoff = policy.calculate_backoff(attempt);
                warn!(
                    operation = op_name,
                    attempt,
                    backoff_ms = backoff.as_millis() as u64,
                    error = %err,
                    "Transient failure, retrying after backoff"
                );
                tokio::time::sleep(backoff).await;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[test]
    fn test_calculate_backoff_exponential() {
        let mut policy = RetryPolicy::standard();
        policy.enable_jitter = false; // 禁用抖动以获得精确值

        assert_eq!(policy.calculate_backoff(1), Duration::from_secs(1));
        assert_eq!(policy.calculate_backoff(2), Duration::from_secs(2)); // 1 * 2^1
        assert_eq!(policy.calculate_backoff(3), Duration::from_secs(4)); // 1 * 2^2
    }

    #[test]
    fn test_verification_backoff_base() {
        let mut policy = RetryPolicy::verification();
        policy.enable_jitter = false;

        assert_eq!(policy.calculate_backoff(1), Duration::from_secs(10));
        assert_eq!(policy.calculate_backoff(2), Duration::from_secs(20));
        assert_eq!(policy.calculate_backoff(3), Duration::from_secs(40));
    }

    #[test]
    fn test_calculate_backoff_max_limit() {
        let mut policy = RetryPolicy::standard();
        policy.max_backoff = Duration::from_secs(5);
        policy.enable_jitter = false;

        let backoff = policy.calculate_backoff(10);
        assert_eq!(backoff, Duration::from_secs(5)); // 被限制在最大值
    }

    #[test]
    fn test_should_retry() {
        let policy = RetryPolicy::standard();

        assert!(policy.should_retry(0));
        assert!(policy.should_retry(2));
        assert!(!policy.should_retry(3)); // max_retries = 3
        assert!(!policy.should_retry(4));
    }

    #[test]
    fn test_next_retry_time() {
        use chrono::TimeZone;

        let mut policy = RetryPolicy::standard();
        policy.enable_jitter = false;

        let base_time = Utc.with_ymd_and_hms(2025, 8, 1, 12, 0, 0).unwrap();
        let next_retry = policy.next_retry_time(2, base_time);
        assert_eq!(next_retry, base_time + chrono::Duration::seconds(2));
    }

    #[tokio::test(start_paused = true)]
    async fn test_with_retries_recovers_after_transient() {
        let policy = RetryPolicy {
            enable_jitter: false,
            initial_backoff: Duration::from_millis(10),
            ..RetryPolicy::standard()
        };
        let calls = AtomicU32::new(0);

        let result: Result<u32, String> = with_retries(&policy, "test_op", |_| true, || {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            async move {
                if n < 2 {
                    Err("timeout".to_string())
                } else {
                    Ok(42)
                }
            }
        })
        .await;

        assert_eq!(result, Ok(42));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_with_retries_permanent_error_fails_fast() {
        let policy = RetryPolicy::standard();
        let calls = AtomicU32::new(0);

        let result: Result<u32, String> =
            with_retries(&policy, "test_op", |_| false, || {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err("bad selector".to_string()) }
            })
            .await;

        assert_eq!(result, Err("bad selector".to_string()));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_with_retries_exhaustion_returns_last_error() {
        let policy = RetryPolicy {
            enable_jitter: false,
            initial_backoff: Duration::from_millis(1),
            ..RetryPolicy::standard()
        };
        let calls = AtomicU32::new(0);

        let result: Result<u32, String> = with_retries(&policy, "test_op", |_| true, || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err("connection reset".to_string()) }
        })
        .await;

        assert_eq!(result, Err("connection reset".to_string()));
        // 首次尝试 + 3 次重试
        assert_eq!(calls.load(Ordering::SeqCst), 4);
    }
}
