use crate::error::{AppError, AppResult, ConfigError};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

/// 程序配置
///
/// 可以来自 TOML 文件，再由环境变量覆盖；缺省项取 [`Config::default`]。
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    // --- 模型后端配置 ---
    pub llm_api_key: String,
    pub llm_api_base_url: String,
    pub llm_model_name: String,
    /// 单次请求超时（秒）
    pub request_timeout_secs: u64,
    /// 单条记录最多尝试次数
    pub max_attempts: usize,
    /// 两次尝试之间的等待（秒）
    pub retry_delay_secs: u64,
    pub max_tokens: u32,
    pub temperature: f32,

    // --- 批处理配置 ---
    /// 每处理多少条记录保存一次
    pub checkpoint_interval: usize,
    /// 同时处理的记录数量，1 表示严格顺序处理
    pub max_concurrent_records: usize,
    /// 失败记录的输出值
    pub error_sentinel: String,
    /// 没有任何图片的记录是否跳过
    pub skip_imageless: bool,

    // --- 序列构建配置 ---
    pub image_root: String,
    pub image_extension: String,
    pub emit_caption_as_separate_segment: bool,

    // --- 记录字段名 ---
    pub body_field: String,
    pub label_prefix: String,
    pub figure_prefix: String,
    pub caption_prefix: String,
    pub target_field: String,

    // --- 输出配置 ---
    pub output_dir: String,
    /// 是否显示详细日志
    pub verbose_logging: bool,
    /// 运行日志文件
    pub output_log_file: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            llm_api_key: String::new(),
            llm_api_base_url: "https://api.openai.com/v1".to_string(),
            llm_model_name: "gpt-4o".to_string(),
            request_timeout_secs: 180,
            max_attempts: 3,
            retry_delay_secs: 10,
            max_tokens: 1024,
            temperature: 0.3,
            checkpoint_interval: 10,
            max_concurrent_records: 1,
            error_sentinel: "error".to_string(),
            skip_imageless: true,
            image_root: "images/AnaFig-image/main-images".to_string(),
            image_extension: ".jpg".to_string(),
            emit_caption_as_separate_segment: true,
            body_field: "context".to_string(),
            label_prefix: "label".to_string(),
            figure_prefix: "figure".to_string(),
            caption_prefix: "caption".to_string(),
            target_field: "summarize_figure".to_string(),
            output_dir: "output".to_string(),
            verbose_logging: false,
            output_log_file: "output.txt".to_string(),
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        Self::default().with_env_overrides()
    }

    /// 读取可选的 TOML 配置文件，再应用环境变量覆盖
    pub fn load(path: Option<&Path>) -> AppResult<Self> {
        let base = match path {
            Some(path) => {
                let content = std::fs::read_to_string(path)
                    .map_err(|e| AppError::file_read_failed(path.display().to_string(), e))?;
                toml::from_str::<Config>(&content).map_err(|e| ConfigError::TomlParseFailed {
                    path: path.display().to_string(),
                    source: e,
                })?
            }
            None => return Self::validated(Self::from_env()),
        };

        Self::validated(base.with_env_overrides())
    }

    fn validated(config: Self) -> AppResult<Self> {
        config.validate()?;
        Ok(config)
    }

    fn with_env_overrides(self) -> Self {
        Self {
            llm_api_key: env_or("LLM_API_KEY", self.llm_api_key),
            llm_api_base_url: env_or("LLM_API_BASE_URL", self.llm_api_base_url),
            llm_model_name: env_or("LLM_MODEL_NAME", self.llm_model_name),
            request_timeout_secs: env_parse_or("REQUEST_TIMEOUT_SECS", self.request_timeout_secs),
            max_attempts: env_parse_or("MAX_ATTEMPTS", self.max_attempts),
            retry_delay_secs: env_parse_or("RETRY_DELAY_SECS", self.retry_delay_secs),
            max_tokens: env_parse_or("MAX_TOKENS", self.max_tokens),
            temperature: env_parse_or("TEMPERATURE", self.temperature),
            checkpoint_interval: env_parse_or("CHECKPOINT_INTERVAL", self.checkpoint_interval),
            max_concurrent_records: env_parse_or(
                "MAX_CONCURRENT_RECORDS",
                self.max_concurrent_records,
            ),
            error_sentinel: env_or("ERROR_SENTINEL", self.error_sentinel),
            skip_imageless: env_parse_or("SKIP_IMAGELESS", self.skip_imageless),
            image_root: env_or("IMAGE_ROOT", self.image_root),
            image_extension: env_or("IMAGE_EXTENSION", self.image_extension),
            emit_caption_as_separate_segment: env_parse_or(
                "EMIT_CAPTION_SEGMENT",
                self.emit_caption_as_separate_segment,
            ),
            body_field: env_or("BODY_FIELD", self.body_field),
            label_prefix: env_or("LABEL_PREFIX", self.label_prefix),
            figure_prefix: env_or("FIGURE_PREFIX", self.figure_prefix),
            caption_prefix: env_or("CAPTION_PREFIX", self.caption_prefix),
            target_field: env_or("TARGET_FIELD", self.target_field),
            output_dir: env_or("OUTPUT_DIR", self.output_dir),
            verbose_logging: env_parse_or("VERBOSE_LOGGING", self.verbose_logging),
            output_log_file: env_or("OUTPUT_LOG_FILE", self.output_log_file),
        }
    }

    /// 检查数值配置是否可用
    pub fn validate(&self) -> AppResult<()> {
        let positive = [
            ("max_attempts", self.max_attempts),
            ("checkpoint_interval", self.checkpoint_interval),
            ("max_concurrent_records", self.max_concurrent_records),
        ];
        for (name, value) in positive {
            if value == 0 {
                return Err(ConfigError::InvalidValue {
                    name: name.to_string(),
                    reason: "必须大于 0".to_string(),
                }
                .into());
            }
        }
        if self.image_extension.is_empty() {
            return Err(ConfigError::InvalidValue {
                name: "image_extension".to_string(),
                reason: "不能为空".to_string(),
            }
            .into());
        }
        if self.error_sentinel.is_empty() {
            return Err(ConfigError::InvalidValue {
                name: "error_sentinel".to_string(),
                reason: "不能为空".to_string(),
            }
            .into());
        }
        Ok(())
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_secs(self.retry_delay_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

fn env_or(name: &str, default: String) -> String {
    std::env::var(name).unwrap_or(default)
}

fn env_parse_or<T: std::str::FromStr>(name: &str, default: T) -> T {
    std::env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_match_observed_constants() {
        let config = Config::default();
        assert_eq!(config.max_attempts, 3);
        assert_eq!(config.checkpoint_interval, 10);
        assert_eq!(config.image_extension, ".jpg");
        assert_eq!(config.error_sentinel, "error");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_toml_partial_override() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "checkpoint_interval = 5\nimage_root = \"imgs/\"\nbody_field = \"paragraphs\""
        )
        .unwrap();

        let config = Config::load(Some(file.path())).unwrap();
        assert_eq!(config.checkpoint_interval, 5);
        assert_eq!(config.image_root, "imgs/");
        assert_eq!(config.body_field, "paragraphs");
        // 未写出的字段取默认值
        assert_eq!(config.label_prefix, "label");
    }

    #[test]
    fn test_load_without_file_uses_env_defaults() {
        let config = Config::load(None).unwrap();
        assert_eq!(config.label_prefix, "label");
    }

    #[test]
    fn test_empty_image_extension_rejected() {
        let config = Config {
            image_extension: String::new(),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_zero_interval_rejected() {
        let config = Config {
            checkpoint_interval: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
