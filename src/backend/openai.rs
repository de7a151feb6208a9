//! OpenAI 兼容后端
//!
//! ## 技术栈
//! - 使用 `async-openai` crate 进行 API 调用
//! - 支持自定义 API 端点和模型
//! - 兼容 OpenAI API 的多模态服务（Qwen-VL、Gemini、Doubao 等）

use async_openai::{
    config::OpenAIConfig,
    types::chat::{
        ChatCompletionRequestMessage, ChatCompletionRequestMessageContentPartImage,
        ChatCompletionRequestMessageContentPartText, ChatCompletionRequestSystemMessageArgs,
        ChatCompletionRequestUserMessageArgs, ChatCompletionRequestUserMessageContent,
        ChatCompletionRequestUserMessageContentPart, CreateChatCompletionRequestArgs, ImageDetail,
        ImageUrl,
    },
    Client,
};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::backend::image::ImageEncoder;
use crate::backend::task::Task;
use crate::backend::Backend;
use crate::config::Config;
use crate::error::{AppError, AppResult, BackendError};
use crate::models::segment::{Segment, Sequence};
use crate::sequence::resolver::{CAPTION_CLOSE, CAPTION_OPEN};

/// OpenAI 兼容的多模态后端
///
/// 职责：
/// - 把一个 Sequence 转成一条多段 user 消息
/// - 只处理单条记录
/// - 不认识数据集，不关心重试和检查点
pub struct OpenAiBackend {
    client: Client<OpenAIConfig>,
    model_name: String,
    task: Task,
    encoder: Arc<dyn ImageEncoder>,
    max_tokens: u32,
    temperature: f32,
}

impl OpenAiBackend {
    pub fn new(config: &Config, task: Task, encoder: Arc<dyn ImageEncoder>) -> Self {
        let openai_config = OpenAIConfig::new()
            .with_api_key(&config.llm_api_key)
            .with_api_base(&config.llm_api_base_url);

        Self {
            client: Client::with_config(openai_config),
            model_name: config.llm_model_name.clone(),
            task,
            encoder,
            max_tokens: config.max_tokens,
            temperature: config.temperature,
        }
    }

    /// 把序列转换为 user 消息的内容片段
    ///
    /// text / caption 作为文本片段，image 交给编码器转成 URL。
    async fn build_content_parts(
        &self,
        sequence: &Sequence,
    ) -> AppResult<Vec<ChatCompletionRequestUserMessageContentPart>> {
        let mut parts = Vec::with_capacity(sequence.segments.len());

        for segment in &sequence.segments {
            let part = match segment {
                Segment::Text(text) => text_part(text.clone()),
                Segment::Caption(caption) => {
                    text_part(format!("{}{}{}", CAPTION_OPEN, caption, CAPTION_CLOSE))
                }
                Segment::Image(path) => {
                    let url = self.encoder.encode(path).await?;
                    ChatCompletionRequestUserMessageContentPart::ImageUrl(
                        ChatCompletionRequestMessageContentPartImage {
                            image_url: ImageUrl {
                                url,
                                detail: Some(ImageDetail::Auto),
                            },
                        },
                    )
                }
            };
            parts.push(part);
        }

        Ok(parts)
    }
}

fn text_part(text: String) -> ChatCompletionRequestUserMessageContentPart {
    ChatCompletionRequestUserMessageContentPart::Text(ChatCompletionRequestMessageContentPartText {
        text,
    })
}

#[async_trait]
impl Backend for OpenAiBackend {
    async fn generate(&self, sequence: &Sequence) -> AppResult<String> {
        debug!(
            "调用 LLM API，模型: {}，{} 段，{} 张图片",
            self.model_name,
            sequence.segments.len(),
            sequence.image_count()
        );

        let system_prompt = self
            .task
            .system_prompt(sequence.target_order.unwrap_or(1));
        let system_msg = ChatCompletionRequestSystemMessageArgs::default()
            .content(system_prompt)
            .build()?;

        let parts = self.build_content_parts(sequence).await?;
        let user_msg = ChatCompletionRequestUserMessageArgs::default()
            .content(ChatCompletionRequestUserMessageContent::Array(parts))
            .build()?;

        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model_name)
            .messages(vec![
                ChatCompletionRequestMessage::System(system_msg),
                ChatCompletionRequestMessage::User(user_msg),
            ])
            .temperature(self.temperature)
            .max_tokens(self.max_tokens)
            .build()?;

        let response = self.client.chat().create(request).await.map_err(|e| {
            warn!("LLM API 调用失败: {}", e);
            AppError::request_failed(&self.model_name, e)
        })?;

        debug!("LLM API 调用成功");

        let content = response
            .choices
            .first()
            .and_then(|choice| choice.message.content.clone())
            .filter(|c| !c.trim().is_empty())
            .ok_or_else(|| {
                AppError::Backend(BackendError::EmptyContent {
                    model: self.model_name.clone(),
                })
            })?;

        Ok(content.trim().to_string())
    }

    fn model_name(&self) -> &str {
        &self.model_name
    }
}
