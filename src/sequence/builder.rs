//! 序列构建
//!
//! 引用表 → 替换 → 分段 → 目标定位，一条记录得到一个 [`Sequence`]。

use crate::config::Config;
use crate::error::{AppError, AppResult};
use crate::models::record::{Record, RecordSchema};
use crate::models::segment::{Segment, Sequence};
use crate::sequence::reference::ReferenceTable;
use crate::sequence::resolver::Resolver;
use crate::sequence::segmenter::Segmenter;
use crate::sequence::target::locate_target;
use tracing::debug;

/// 追加在序列末尾的参考字段
///
/// 输出为 `<tag>value<tag/>` 形式的文本段，便于下游区分正文和参考内容。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppendedField {
    pub field: String,
    pub tag: String,
    /// 缺失时是否视为格式错误；否则直接省略
    pub required: bool,
}

impl AppendedField {
    pub fn required(field: impl Into<String>, tag: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            tag: tag.into(),
            required: true,
        }
    }

    pub fn optional(field: impl Into<String>, tag: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            tag: tag.into(),
            required: false,
        }
    }

    fn render(&self, value: &str) -> String {
        format!("<{tag}>{value}<{tag}/>", tag = self.tag, value = value)
    }
}

/// 序列构建配置
#[derive(Debug, Clone)]
pub struct SequenceConfig {
    pub schema: RecordSchema,
    pub image_root: String,
    pub image_extension: String,
    pub emit_caption_as_separate_segment: bool,
    pub appended_fields: Vec<AppendedField>,
}

impl Default for SequenceConfig {
    fn default() -> Self {
        Self {
            schema: RecordSchema::default(),
            image_root: "images/AnaFig-image/main-images".to_string(),
            image_extension: ".jpg".to_string(),
            emit_caption_as_separate_segment: true,
            appended_fields: Vec::new(),
        }
    }
}

impl SequenceConfig {
    pub fn from_config(config: &Config, appended_fields: Vec<AppendedField>) -> Self {
        Self {
            schema: RecordSchema {
                body_field: config.body_field.clone(),
                label_prefix: config.label_prefix.clone(),
                figure_prefix: config.figure_prefix.clone(),
                caption_prefix: config.caption_prefix.clone(),
                target_field: config.target_field.clone(),
            },
            image_root: config.image_root.clone(),
            image_extension: config.image_extension.clone(),
            emit_caption_as_separate_segment: config.emit_caption_as_separate_segment,
            appended_fields,
        }
    }
}

/// 序列构建器
pub struct SequenceBuilder {
    schema: RecordSchema,
    resolver: Resolver,
    segmenter: Segmenter,
    appended_fields: Vec<AppendedField>,
}

impl SequenceBuilder {
    pub fn new(config: SequenceConfig) -> AppResult<Self> {
        Ok(Self {
            resolver: Resolver::new(config.image_root, config.image_extension.clone())?,
            segmenter: Segmenter::new(
                config.image_extension,
                config.emit_caption_as_separate_segment,
            ),
            schema: config.schema,
            appended_fields: config.appended_fields,
        })
    }

    pub fn schema(&self) -> &RecordSchema {
        &self.schema
    }

    /// 构建一条记录的序列
    ///
    /// 正文缺失、必需的追加字段缺失时返回错误；无法解析的标签只会被跳过。
    pub fn build(&self, record: &Record) -> AppResult<Sequence> {
        let body = record.body(&self.schema)?;
        let table = ReferenceTable::from_record(record, &self.schema);
        let resolved = self.resolver.resolve(body, &table);
        let mut segments = self.segmenter.segment(&resolved);
        // 正文清理后为空时仍保留一个文本段
        if segments.is_empty() {
            segments.push(Segment::Text(String::new()));
        }

        let image_count = segments.iter().filter(|s| s.is_image()).count();
        let target_order = locate_target(
            &segments,
            record.target_figure(&self.schema),
            self.resolver.image_extension(),
        );

        let mut appended = 0;
        for extra in &self.appended_fields {
            match record.get(&extra.field) {
                Some(value) => {
                    let value = value
                        .as_str()
                        .map(str::to_string)
                        .unwrap_or_else(|| value.to_string());
                    segments.push(Segment::Text(extra.render(&value)));
                    appended += 1;
                }
                None if extra.required => {
                    return Err(AppError::missing_field(&extra.field));
                }
                None => {}
            }
        }

        debug!(
            "序列构建完成: {} 段, {} 张图片, 目标序号 {:?}",
            segments.len(),
            image_count,
            target_order
        );

        Ok(Sequence {
            segments,
            target_order,
            appended,
        })
    }
}
