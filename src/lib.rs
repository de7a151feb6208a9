//! # AnaFig Batch
//!
//! 为带图论文片段批量生成图表摘要、并对摘要打分的 Rust 应用程序
//!
//! ## 架构设计
//!
//! 本系统采用四层架构：
//!
//! ### ① 数据与序列层（Models / Sequence）
//! - `models/` - 记录、数据集和 JSON 读写
//! - `sequence/` - 把正文里的 `{token}` 引用解析成图片路径，切分成
//!   text / image / caption 交错序列，并定位目标图片
//!
//! ### ② 后端层（Backend）
//! - `backend/` - 描述"我能向模型要什么"，只处理单个序列
//! - `Backend` - 外部生成/评分服务接口
//! - `OpenAiBackend` - OpenAI 兼容的多模态实现
//! - `retry` - 超时、重试和错误哨兵
//!
//! ### ③ 流程层（Workflow）
//! - `workflow/` - 定义"一条记录"的完整处理流程
//! - `RecordCtx` - 上下文封装（key + 序号）
//! - `RecordFlow` - 流程编排（前置检查 → 构建序列 → 调用后端）
//!
//! ### ④ 编排层（Orchestration）
//! - `orchestrator/batch_processor` - 批量处理数据集，管理并发和检查点
//! - `app` - 路径约定、断点续跑、错误列表
//!
//! ## 模块结构

pub mod app;
pub mod backend;
pub mod config;
pub mod error;
pub mod models;
pub mod orchestrator;
pub mod sequence;
pub mod utils;
pub mod workflow;

// 重新导出常用类型
pub use app::App;
pub use backend::{Backend, Task};
pub use config::Config;
pub use error::{AppError, AppResult};
pub use models::{Dataset, Record, Segment, Sequence};
pub use orchestrator::{BatchProcessor, CancelFlag, RunReport};
pub use sequence::SequenceBuilder;
pub use workflow::{RecordCtx, RecordFlow, RecordOutcome};
