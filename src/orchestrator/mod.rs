//! 编排层（Orchestration Layer）
//!
//! ## 职责
//!
//! 本层负责整个数据集的批量处理，是整个系统的"指挥中心"。
//!
//! ## 模块划分
//!
//! ### `batch_processor` - 批量记录处理器
//! - 区分已完成 / 待处理记录，已完成的直接跳过
//! - 控制并发数量（Semaphore），结果由处理器统一写回
//! - 失败记录写入错误哨兵，记入错误列表
//! - 定期写检查点，输出统计信息
//!
//! ### `checkpoint` - 检查点写入
//! - `CheckpointSink` 抽象持久化目标，默认实现写 JSON 文件
//!
//! ### `cancel` - 取消信号
//! - 在记录之间检查，收到后停止派发并做最后一次保存
//!
//! ## 层次关系
//!
//! ```text
//! batch_processor (处理 Dataset)
//!     ↓
//! RecordFlow (处理单条 Record)
//!     ↓
//! SequenceBuilder + Backend
//! ```

pub mod batch_processor;
pub mod cancel;
pub mod checkpoint;

pub use batch_processor::{BatchProcessor, RunReport};
pub use cancel::CancelFlag;
pub use checkpoint::{CheckpointSink, JsonFileSink};
