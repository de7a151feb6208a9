//! 单条记录处理流程 - 流程层
//!
//! 核心职责：定义“一条记录”的完整处理流程
//!
//! 流程顺序：
//! 1. 检查前置字段（评分任务需要已有的生成摘要）
//! 2. 构建序列（引用替换 → 分段 → 目标定位）
//! 3. 没有图片的记录跳过
//! 4. 调用后端（带重试）

use std::sync::Arc;
use tracing::{info, warn};

use crate::backend::{generate_with_retry, Backend, GenerateOutcome, RetryPolicy};
use crate::config::Config;
use crate::models::record::Record;
use crate::sequence::SequenceBuilder;
use crate::workflow::record_ctx::RecordCtx;

/// 记录处理结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordOutcome {
    /// 后端返回了结果
    Done(String),
    /// 序列构建失败或重试耗尽
    Failed { reason: String },
    /// 不满足处理条件，保持待处理状态
    Skipped { reason: String },
}

/// 单条记录处理流程
///
/// - 不持有数据集，只读一份记录副本
/// - 不会返回错误：所有失败都转成 [`RecordOutcome::Failed`]
pub struct RecordFlow {
    builder: SequenceBuilder,
    backend: Arc<dyn Backend>,
    policy: RetryPolicy,
    sentinel: String,
    prerequisite_field: Option<String>,
    skip_imageless: bool,
    verbose_logging: bool,
}

impl RecordFlow {
    pub fn new(builder: SequenceBuilder, backend: Arc<dyn Backend>, config: &Config) -> Self {
        Self {
            builder,
            backend,
            policy: RetryPolicy::from_config(config),
            sentinel: config.error_sentinel.clone(),
            prerequisite_field: None,
            skip_imageless: config.skip_imageless,
            verbose_logging: config.verbose_logging,
        }
    }

    /// 设置前置字段：缺少该字段或其值为错误哨兵的记录直接跳过
    pub fn with_prerequisite(mut self, field: Option<impl Into<String>>) -> Self {
        self.prerequisite_field = field.map(Into::into);
        self
    }

    pub fn with_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn sentinel(&self) -> &str {
        &self.sentinel
    }

    pub async fn run(&self, ctx: &RecordCtx, record: &Record) -> RecordOutcome {
        if let Some(field) = &self.prerequisite_field {
            let reason = match record.get(field) {
                None => Some(format!("缺少前置字段 {}", field)),
                Some(value) if value.as_str() == Some(self.sentinel.as_str()) => {
                    Some(format!("前置字段 {} 为错误标记", field))
                }
                Some(_) => None,
            };
            if let Some(reason) = reason {
                info!("{} ⏭️ {}，跳过", ctx, reason);
                return RecordOutcome::Skipped { reason };
            }
        }

        // ========== 构建序列 ==========
        let sequence = match self.builder.build(record) {
            Ok(sequence) => sequence,
            Err(e) => {
                warn!("{} ❌ 序列构建失败: {}", ctx, e);
                return RecordOutcome::Failed {
                    reason: e.to_string(),
                };
            }
        };

        if self.verbose_logging {
            for (i, segment) in sequence.document_segments().iter().enumerate() {
                info!(
                    "{}   {}. {:?}",
                    ctx,
                    i + 1,
                    crate::utils::logging::truncate_text(segment.content(), 60)
                );
            }
            for segment in sequence.appended_segments() {
                info!(
                    "{}   + {:?}",
                    ctx,
                    crate::utils::logging::truncate_text(segment.content(), 60)
                );
            }
        }

        if sequence.target_order.is_none() && self.skip_imageless {
            let reason = "没有图片段".to_string();
            info!("{} ⏭️ {}，跳过", ctx, reason);
            return RecordOutcome::Skipped { reason };
        }

        info!(
            "{} 🤖 调用后端: {} 段, {} 张图片, 目标图片 #{}",
            ctx,
            sequence.segments.len(),
            sequence.image_count(),
            sequence.target_order.unwrap_or(1)
        );

        // ========== 调用后端 ==========
        match generate_with_retry(self.backend.as_ref(), &sequence, &self.policy, &self.sentinel)
            .await
        {
            GenerateOutcome::Output(output) => {
                info!(
                    "{} ✓ {}",
                    ctx,
                    crate::utils::logging::truncate_text(&output, 80)
                );
                RecordOutcome::Done(output)
            }
            GenerateOutcome::Exhausted {
                attempts,
                last_error,
            } => {
                warn!("{} ❌ 已尝试 {} 次仍失败: {}", ctx, attempts, last_error);
                RecordOutcome::Failed { reason: last_error }
            }
        }
    }
}
