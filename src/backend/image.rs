//! 图片读取
//!
//! 序列里只有路径；真正发请求时才把图片读出来编码成 data URL。
//! 不做缩放和格式转换。

use crate::error::{AppError, AppResult, BackendError};
use async_trait::async_trait;
use base64::{engine::general_purpose, Engine};
use std::path::Path;

#[async_trait]
pub trait ImageEncoder: Send + Sync {
    /// 把图片路径转成后端可用的 URL
    async fn encode(&self, path: &str) -> AppResult<String>;
}

/// 读取本地文件并编码为 `data:<mime>;base64,...`
#[derive(Debug, Default, Clone)]
pub struct DataUrlEncoder;

#[async_trait]
impl ImageEncoder for DataUrlEncoder {
    async fn encode(&self, path: &str) -> AppResult<String> {
        let bytes = tokio::fs::read(path).await.map_err(|e| {
            AppError::Backend(BackendError::ImageUnavailable {
                path: path.to_string(),
                source: e,
            })
        })?;
        Ok(format!(
            "data:{};base64,{}",
            mime_for(path),
            general_purpose::STANDARD.encode(bytes)
        ))
    }
}

/// 原样传递路径（路径本身已经是 URL 时使用）
#[derive(Debug, Default, Clone)]
pub struct PassthroughEncoder;

#[async_trait]
impl ImageEncoder for PassthroughEncoder {
    async fn encode(&self, path: &str) -> AppResult<String> {
        Ok(path.to_string())
    }
}

fn mime_for(path: &str) -> &'static str {
    let ext = Path::new(path)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());
    match ext.as_deref() {
        Some("png") => "image/png",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        _ => "image/jpeg",
    }
}
