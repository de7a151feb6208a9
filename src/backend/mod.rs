//! 模型后端层
//!
//! 编排层只通过 [`Backend`] 这一个接口访问外部模型服务；
//! 鉴权、传输、图片编码都封装在具体实现里。

pub mod image;
pub mod openai;
pub mod retry;
pub mod task;

use crate::error::AppResult;
use crate::models::segment::Sequence;
use async_trait::async_trait;

pub use image::{DataUrlEncoder, ImageEncoder, PassthroughEncoder};
pub use openai::OpenAiBackend;
pub use retry::{generate_or_sentinel, generate_with_retry, GenerateOutcome, RetryPolicy};
pub use task::Task;

/// 外部生成/评分服务
///
/// 一次调用对应一次尝试；重试、超时和哨兵值由 [`retry`] 统一处理。
#[async_trait]
pub trait Backend: Send + Sync {
    async fn generate(&self, sequence: &Sequence) -> AppResult<String>;

    fn model_name(&self) -> &str;
}
