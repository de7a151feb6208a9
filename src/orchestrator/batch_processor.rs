//! 批量记录处理器 - 编排层
//!
//! ## 职责
//!
//! 遍历整个数据集，驱动每条待处理记录走完 [`RecordFlow`]，并定期写检查点。
//!
//! ## 记录状态
//!
//! ```text
//! pending (无输出 / 输出为错误哨兵) → in_flight → done | failed
//! ```
//!
//! - 已经 done 的记录直接跳过，重复运行会从上次停下的地方继续
//! - failed 的记录输出字段写入错误哨兵，并记入错误列表
//! - 每处理 `checkpoint_interval` 条（done + failed，全局计数）保存一次，结束时再无条件保存一次
//!
//! ## 并发
//!
//! 默认严格顺序处理。`max_concurrent_records > 1` 时按块派发：块内每条记录一个任务，
//! 任务只拿到记录副本并返回结果，由本处理器统一写回数据集和检查点（单写者）。
//! 单个任务失败或 panic 只影响它自己那条记录。

use futures::future::join_all;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tracing::{error, info, warn};

use crate::error::AppResult;
use crate::models::Dataset;
use crate::orchestrator::cancel::CancelFlag;
use crate::orchestrator::checkpoint::CheckpointSink;
use crate::workflow::{RecordCtx, RecordFlow, RecordOutcome};

/// 一次运行的统计
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RunReport {
    /// 数据集记录总数
    pub total: usize,
    /// 本次实际处理（done + failed）的记录数
    pub processed: usize,
    pub succeeded: usize,
    /// 失败记录的 ID，按处理顺序
    pub failed_keys: Vec<String>,
    /// 运行前已经完成的记录数
    pub skipped_done: usize,
    /// 不满足处理条件而跳过的记录数
    pub skipped_other: usize,
    /// 写检查点的次数（含最终保存）
    pub checkpoints: usize,
    /// 是否被外部取消
    pub cancelled: bool,
}

impl RunReport {
    pub fn failed(&self) -> usize {
        self.failed_keys.len()
    }
}

/// 批量处理器
pub struct BatchProcessor {
    flow: Arc<RecordFlow>,
    sink: Arc<dyn CheckpointSink>,
    output_field: String,
    checkpoint_interval: usize,
    max_concurrent: usize,
    cancel: CancelFlag,
}

impl BatchProcessor {
    pub fn new(
        flow: RecordFlow,
        sink: Arc<dyn CheckpointSink>,
        output_field: impl Into<String>,
    ) -> Self {
        Self {
            flow: Arc::new(flow),
            sink,
            output_field: output_field.into(),
            checkpoint_interval: 10,
            max_concurrent: 1,
            cancel: CancelFlag::new(),
        }
    }

    pub fn with_checkpoint_interval(mut self, interval: usize) -> Self {
        self.checkpoint_interval = interval.max(1);
        self
    }

    pub fn with_max_concurrent(mut self, max_concurrent: usize) -> Self {
        self.max_concurrent = max_concurrent.max(1);
        self
    }

    pub fn with_cancel_flag(mut self, cancel: CancelFlag) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn cancel_flag(&self) -> CancelFlag {
        self.cancel.clone()
    }

    /// 记录是否已经完成：有输出字段且不是错误哨兵
    pub fn is_done(&self, dataset: &Dataset, key: &str) -> bool {
        match dataset.raw(key).and_then(|v| v.get(&self.output_field)) {
            Some(value) => value.as_str() != Some(self.flow.sentinel()),
            None => false,
        }
    }

    /// 处理整个数据集
    ///
    /// 只有检查点写入失败会返回错误；单条记录的失败都记录在 [`RunReport`] 中。
    pub async fn run(&self, dataset: &mut Dataset) -> AppResult<RunReport> {
        let keys = dataset.keys();
        let total = keys.len();
        let mut report = RunReport {
            total,
            ..Default::default()
        };

        // 收集待处理记录（保持数据集顺序）
        let mut pending = Vec::new();
        for (idx, key) in keys.into_iter().enumerate() {
            if self.is_done(dataset, &key) {
                report.skipped_done += 1;
            } else {
                pending.push(RecordCtx::new(key, idx + 1, total));
            }
        }

        log_run_start(total, report.skipped_done, pending.len(), self.max_concurrent);

        let semaphore = Arc::new(Semaphore::new(self.max_concurrent));

        for chunk in pending.chunks(self.max_concurrent) {
            if self.cancel.is_cancelled() {
                warn!("⚠️ 收到取消信号，停止派发新记录");
                report.cancelled = true;
                break;
            }

            let outcomes = self.process_chunk(dataset, chunk, &semaphore).await;

            for (ctx, outcome) in outcomes {
                let counted = self.apply_outcome(dataset, &ctx, outcome, &mut report);

                if counted && report.processed % self.checkpoint_interval == 0 {
                    self.checkpoint(dataset, &mut report).await?;
                }
            }
        }

        // 最终保存
        self.checkpoint(dataset, &mut report).await?;
        log_run_complete(&report);

        Ok(report)
    }

    /// 并发处理一块记录，结果按块内顺序返回
    async fn process_chunk(
        &self,
        dataset: &Dataset,
        chunk: &[RecordCtx],
        semaphore: &Arc<Semaphore>,
    ) -> Vec<(RecordCtx, RecordOutcome)> {
        let mut handles = Vec::with_capacity(chunk.len());
        let mut immediate = Vec::new();

        for (pos, ctx) in chunk.iter().enumerate() {
            let record = match dataset.record(&ctx.key) {
                Some(Ok(record)) => record,
                Some(Err(e)) => {
                    error!("{} ❌ {}", ctx, e);
                    immediate.push((
                        pos,
                        RecordOutcome::Failed {
                            reason: e.to_string(),
                        },
                    ));
                    continue;
                }
                None => continue,
            };

            let flow = Arc::clone(&self.flow);
            let semaphore = Arc::clone(semaphore);
            let task_ctx = ctx.clone();
            handles.push((
                pos,
                tokio::spawn(async move {
                    // 信号量不会被关闭
                    let _permit = semaphore.acquire_owned().await.ok();
                    flow.run(&task_ctx, &record).await
                }),
            ));
        }

        let (positions, futures): (Vec<usize>, Vec<_>) = handles.into_iter().unzip();
        let joined = join_all(futures).await;

        let mut results: Vec<(usize, RecordOutcome)> = immediate;
        for (pos, joined) in positions.into_iter().zip(joined) {
            let outcome = match joined {
                Ok(outcome) => outcome,
                Err(e) => {
                    error!("{} 任务执行失败: {}", chunk[pos], e);
                    RecordOutcome::Failed {
                        reason: format!("任务执行失败: {}", e),
                    }
                }
            };
            results.push((pos, outcome));
        }
        results.sort_by_key(|(pos, _)| *pos);

        results
            .into_iter()
            .map(|(pos, outcome)| (chunk[pos].clone(), outcome))
            .collect()
    }

    /// 把结果写回数据集，返回是否计入已处理数
    fn apply_outcome(
        &self,
        dataset: &mut Dataset,
        ctx: &RecordCtx,
        outcome: RecordOutcome,
        report: &mut RunReport,
    ) -> bool {
        match outcome {
            RecordOutcome::Done(output) => {
                dataset.set_field(&ctx.key, &self.output_field, output);
                report.processed += 1;
                report.succeeded += 1;
                true
            }
            RecordOutcome::Failed { reason } => {
                if !dataset.set_field(&ctx.key, &self.output_field, self.flow.sentinel()) {
                    warn!("{} 记录不是对象，无法写入错误标记", ctx);
                }
                error!("{} ❌ 处理失败: {}", ctx, reason);
                report.processed += 1;
                report.failed_keys.push(ctx.key.clone());
                true
            }
            RecordOutcome::Skipped { .. } => {
                report.skipped_other += 1;
                false
            }
        }
    }

    async fn checkpoint(&self, dataset: &Dataset, report: &mut RunReport) -> AppResult<()> {
        self.sink.save(dataset).await?;
        report.checkpoints += 1;
        info!(
            "💾 检查点已保存: 已处理 {} 条 (成功 {}, 失败 {})",
            report.processed,
            report.succeeded,
            report.failed()
        );
        Ok(())
    }
}

// ========== 日志辅助函数 ==========

fn log_run_start(total: usize, already_done: usize, pending: usize, max_concurrent: usize) {
    info!("{}", "=".repeat(60));
    info!("📁 数据集共 {} 条记录", total);
    info!("✓ 已完成 {} 条，待处理 {} 条", already_done, pending);
    info!("📊 最大并发数: {}", max_concurrent);
    info!("{}", "=".repeat(60));
}

fn log_run_complete(report: &RunReport) {
    info!("\n{}", "─".repeat(60));
    info!(
        "✓ 本轮完成: 处理 {} 条, 成功 {}, 失败 {}, 跳过 {}",
        report.processed,
        report.succeeded,
        report.failed(),
        report.skipped_other
    );
    if report.cancelled {
        warn!("⚠️ 运行被取消，剩余记录保持待处理状态");
    }
    info!("{}", "─".repeat(60));
}
