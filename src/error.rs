use thiserror::Error;

/// 应用程序错误类型
#[derive(Debug, Error)]
pub enum AppError {
    /// 条目数据错误
    #[error("条目错误: {0}")]
    Record(#[from] RecordError),
    /// 模型后端错误
    #[error("后端错误: {0}")]
    Backend(#[from] BackendError),
    /// 文件操作错误
    #[error("文件错误: {0}")]
    File(#[from] FileError),
    /// 配置错误
    #[error("配置错误: {0}")]
    Config(#[from] ConfigError),
    /// 其他错误（用于包装第三方库错误）
    #[error("错误: {0}")]
    Other(String),
}

/// 条目数据错误
#[derive(Debug, Error)]
pub enum RecordError {
    /// 条目不是 JSON 对象
    #[error("条目 {key} 不是 JSON 对象")]
    NotAnObject { key: String },
    /// 缺少必需字段
    #[error("缺少必需字段: {field}")]
    MissingField { field: String },
    /// 字段类型不是字符串
    #[error("字段 {field} 不是字符串")]
    NotAString { field: String },
}

/// 模型后端错误
#[derive(Debug, Error)]
pub enum BackendError {
    /// 请求失败（网络、鉴权、服务端错误）
    #[error("请求失败 (模型: {model}): {source}")]
    RequestFailed {
        model: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// 请求超时
    #[error("请求超时 (模型: {model}, {timeout_secs} 秒)")]
    Timeout { model: String, timeout_secs: u64 },
    /// 返回内容为空
    #[error("返回内容为空 (模型: {model})")]
    EmptyContent { model: String },
    /// 后端返回了错误哨兵值
    #[error("后端返回错误标记: {sentinel}")]
    SentinelReturned { sentinel: String },
    /// 图片无法读取
    #[error("图片无法读取 ({path}): {source}")]
    ImageUnavailable {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// 文件操作错误
#[derive(Debug, Error)]
pub enum FileError {
    /// 读取文件失败
    #[error("读取文件失败 ({path}): {source}")]
    ReadFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },
    /// 写入文件失败
    #[error("写入文件失败 ({path}): {source}")]
    WriteFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },
    /// JSON 解析失败
    #[error("JSON解析失败 ({path}): {source}")]
    JsonParseFailed {
        path: String,
        #[source]
        source: serde_json::Error,
    },
    /// 数据集顶层不是对象
    #[error("数据集顶层必须是 JSON 对象: {path}")]
    NotAnObject { path: String },
}

/// 配置错误
#[derive(Debug, Error)]
pub enum ConfigError {
    /// 配置文件解析失败
    #[error("配置文件 {path} 解析失败: {source}")]
    TomlParseFailed {
        path: String,
        #[source]
        source: toml::de::Error,
    },
    /// 配置值非法
    #[error("配置项 {name} 非法: {reason}")]
    InvalidValue { name: String, reason: String },
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::File(FileError::JsonParseFailed {
            path: String::new(),
            source: err,
        })
    }
}

impl From<regex::Error> for AppError {
    fn from(err: regex::Error) -> Self {
        AppError::Other(format!("正则表达式编译失败: {}", err))
    }
}

impl From<async_openai::error::OpenAIError> for AppError {
    fn from(err: async_openai::error::OpenAIError) -> Self {
        AppError::Other(err.to_string())
    }
}

// ========== 便捷构造函数 ==========

impl AppError {
    /// 创建缺少字段错误
    pub fn missing_field(field: impl Into<String>) -> Self {
        AppError::Record(RecordError::MissingField {
            field: field.into(),
        })
    }

    /// 创建后端请求失败错误
    pub fn request_failed(
        model: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        AppError::Backend(BackendError::RequestFailed {
            model: model.into(),
            source: Box::new(source),
        })
    }

    /// 创建文件读取错误
    pub fn file_read_failed(path: impl Into<String>, source: std::io::Error) -> Self {
        AppError::File(FileError::ReadFailed {
            path: path.into(),
            source,
        })
    }

    /// 创建文件写入错误
    pub fn file_write_failed(path: impl Into<String>, source: std::io::Error) -> Self {
        AppError::File(FileError::WriteFailed {
            path: path.into(),
            source,
        })
    }

    /// 是否值得重试
    ///
    /// 只有网络层面的失败（请求失败、超时、空返回、哨兵值）会被重试，
    /// 数据错误和本地文件错误重试也不会成功。
    pub fn is_transient(&self) -> bool {
        match self {
            AppError::Backend(BackendError::ImageUnavailable { .. }) => false,
            AppError::Backend(_) => true,
            AppError::Other(_) => true,
            _ => false,
        }
    }
}

// ========== Result 类型别名 ==========

/// 应用程序结果类型
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_classification() {
        let timeout = AppError::Backend(BackendError::Timeout {
            model: "m".to_string(),
            timeout_secs: 1,
        });
        assert!(timeout.is_transient());

        let image = AppError::Backend(BackendError::ImageUnavailable {
            path: "imgs/a.jpg".to_string(),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "missing"),
        });
        assert!(!image.is_transient());

        assert!(!AppError::missing_field("context").is_transient());
    }

    #[test]
    fn test_display_contains_field() {
        let err = AppError::missing_field("context");
        assert!(err.to_string().contains("context"));
    }
}
