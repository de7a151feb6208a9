//! 重试策略
//!
//! 后端对外的约定是“永不抛错”：所有尝试都失败后返回错误哨兵值。

use crate::backend::Backend;
use crate::config::Config;
use crate::error::{AppError, BackendError};
use crate::models::segment::Sequence;
use std::time::Duration;
use tokio::time::{sleep, timeout};
use tracing::{debug, warn};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// 最多尝试次数（至少 1 次）
    pub max_attempts: usize,
    /// 两次尝试之间的固定等待
    pub delay: Duration,
    /// 单次调用超时
    pub timeout: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            delay: Duration::from_secs(10),
            timeout: Duration::from_secs(180),
        }
    }
}

impl RetryPolicy {
    pub fn from_config(config: &Config) -> Self {
        Self {
            max_attempts: config.max_attempts.max(1),
            delay: config.retry_delay(),
            timeout: config.request_timeout(),
        }
    }
}

/// 调用结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GenerateOutcome {
    /// 后端正常返回
    Output(String),
    /// 所有尝试都失败，附最后一次的错误描述
    Exhausted { attempts: usize, last_error: String },
}

/// 带重试地调用后端
///
/// 不可重试的错误（如图片缺失）立即结束；返回哨兵值视为失败的一次尝试。
pub async fn generate_with_retry(
    backend: &dyn Backend,
    sequence: &Sequence,
    policy: &RetryPolicy,
    sentinel: &str,
) -> GenerateOutcome {
    let max_attempts = policy.max_attempts.max(1);
    let mut last_error = String::new();

    for attempt in 1..=max_attempts {
        let error = match timeout(policy.timeout, backend.generate(sequence)).await {
            Ok(Ok(output)) if output != sentinel => {
                debug!("后端调用成功 (尝试 {}/{})", attempt, max_attempts);
                return GenerateOutcome::Output(output);
            }
            Ok(Ok(_)) => AppError::Backend(BackendError::SentinelReturned {
                sentinel: sentinel.to_string(),
            }),
            Ok(Err(e)) => e,
            Err(_) => AppError::Backend(BackendError::Timeout {
                model: backend.model_name().to_string(),
                timeout_secs: policy.timeout.as_secs(),
            }),
        };

        warn!("后端调用失败 (尝试 {}/{}): {}", attempt, max_attempts, error);
        last_error = error.to_string();

        if !error.is_transient() {
            return GenerateOutcome::Exhausted {
                attempts: attempt,
                last_error,
            };
        }
        if attempt < max_attempts {
            sleep(policy.delay).await;
        }
    }

    GenerateOutcome::Exhausted {
        attempts: max_attempts,
        last_error,
    }
}

/// 对外约定：永远返回字符串，失败时返回哨兵值
pub async fn generate_or_sentinel(
    backend: &dyn Backend,
    sequence: &Sequence,
    policy: &RetryPolicy,
    sentinel: &str,
) -> String {
    match generate_with_retry(backend, sequence, policy, sentinel).await {
        GenerateOutcome::Output(output) => output,
        GenerateOutcome::Exhausted { .. } => sentinel.to_string(),
    }
}
