use crate::error::{AppError, AppResult, RecordError};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};

/// 记录字段命名规则
///
/// 不同数据文件的字段名略有差异（`context` / `paragraphs` 等），统一在这里配置。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordSchema {
    /// 正文字段
    pub body_field: String,
    /// 引用标签字段前缀，如 `label1`
    pub label_prefix: String,
    /// 图片 ID 字段前缀，如 `figure1`
    pub figure_prefix: String,
    /// 图注字段前缀，如 `caption1`
    pub caption_prefix: String,
    /// 目标图片字段
    pub target_field: String,
}

impl Default for RecordSchema {
    fn default() -> Self {
        Self {
            body_field: "context".to_string(),
            label_prefix: "label".to_string(),
            figure_prefix: "figure".to_string(),
            caption_prefix: "caption".to_string(),
            target_field: "summarize_figure".to_string(),
        }
    }
}

/// 一条标注过的文档片段
///
/// 字段是动态的（`label1`、`figure1`、`caption1` ...），所以直接包装 JSON 对象。
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record(Map<String, JsonValue>);

impl Record {
    /// 从数据集中的 JSON 值构建记录，非对象视为格式错误
    pub fn from_value(key: &str, value: &JsonValue) -> AppResult<Self> {
        match value {
            JsonValue::Object(map) => Ok(Self(map.clone())),
            _ => Err(RecordError::NotAnObject {
                key: key.to_string(),
            }
            .into()),
        }
    }

    pub fn get(&self, field: &str) -> Option<&JsonValue> {
        self.0.get(field)
    }

    /// 字符串字段，缺失或类型不对时返回 `None`
    pub fn str_field(&self, field: &str) -> Option<&str> {
        self.0.get(field).and_then(|v| v.as_str())
    }

    /// 必需的字符串字段
    pub fn require_str(&self, field: &str) -> AppResult<&str> {
        match self.0.get(field) {
            Some(JsonValue::String(s)) => Ok(s.as_str()),
            Some(_) => Err(RecordError::NotAString {
                field: field.to_string(),
            }
            .into()),
            None => Err(AppError::missing_field(field)),
        }
    }

    /// 正文
    pub fn body(&self, schema: &RecordSchema) -> AppResult<&str> {
        self.require_str(&schema.body_field)
    }

    /// 目标图片 ID，空字符串视为未指定
    pub fn target_figure(&self, schema: &RecordSchema) -> Option<&str> {
        self.str_field(&schema.target_field).filter(|s| !s.is_empty())
    }

    /// 所有标签字段（按前缀判断），顺序与字段顺序一致，不一定是正文顺序
    pub fn label_fields<'a>(
        &'a self,
        schema: &'a RecordSchema,
    ) -> impl Iterator<Item = (&'a str, &'a JsonValue)> + 'a {
        self.0
            .iter()
            .filter(move |(key, _)| key.starts_with(&schema.label_prefix))
            .map(|(key, value)| (key.as_str(), value))
    }

}

/// 取字段名中的数字部分，`label12` → `12`
pub fn numeric_suffix(field_name: &str) -> String {
    field_name.chars().filter(|c| c.is_ascii_digit()).collect()
}
