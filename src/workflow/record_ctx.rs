//! 记录处理上下文
//!
//! 封装“我正在处理数据集里的第几条、哪一条”这一信息

use std::fmt::Display;

/// 记录处理上下文
#[derive(Debug, Clone)]
pub struct RecordCtx {
    /// 记录 ID
    pub key: String,

    /// 在数据集中的位置（从1开始，仅用于日志显示）
    pub index: usize,

    /// 数据集记录总数
    pub total: usize,
}

impl RecordCtx {
    pub fn new(key: impl Into<String>, index: usize, total: usize) -> Self {
        Self {
            key: key.into(),
            index,
            total,
        }
    }
}

impl Display for RecordCtx {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[条目 {}/{} {}]", self.index, self.total, self.key)
    }
}
