//! 检查点
//!
//! 整个数据集是崩溃恢复的最小单位：每次保存都写全量。

use crate::error::AppResult;
use crate::models::Dataset;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tracing::debug;

/// 检查点写入目标
///
/// 写入失败对整个运行是致命的：没有持久化就无法安全地继续。
#[async_trait]
pub trait CheckpointSink: Send + Sync {
    async fn save(&self, dataset: &Dataset) -> AppResult<()>;
}

/// 写 JSON 文件
#[derive(Debug, Clone)]
pub struct JsonFileSink {
    path: PathBuf,
}

impl JsonFileSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl CheckpointSink for JsonFileSink {
    async fn save(&self, dataset: &Dataset) -> AppResult<()> {
        dataset.save(&self.path).await?;
        debug!("检查点已写入: {}", self.path.display());
        Ok(())
    }
}
