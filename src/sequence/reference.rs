//! 引用表
//!
//! 从一条记录中找出所有 `标签 → (图片 ID, 图注)` 绑定。

use crate::models::record::{numeric_suffix, Record, RecordSchema};
use tracing::warn;

/// 一个引用绑定
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Binding {
    /// 标签字段名中的数字部分
    pub index: String,
    /// 正文中的引用记号（不含花括号）
    pub token: String,
    pub figure_id: String,
    /// 缺省为空字符串
    pub caption: String,
}

impl Binding {
    /// 正文中出现的形式：`{token}`
    pub fn placeholder(&self) -> String {
        format!("{{{}}}", self.token)
    }
}

/// 一条记录的引用表
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReferenceTable {
    pub bindings: Vec<Binding>,
    /// 无法解析的标签字段名（没有对应的图片字段）
    pub unresolved: Vec<String>,
}

impl ReferenceTable {
    pub fn from_record(record: &Record, schema: &RecordSchema) -> Self {
        let mut table = ReferenceTable::default();

        for (field, value) in record.label_fields(schema) {
            let Some(token) = value.as_str() else {
                warn!("标签字段 {} 不是字符串，已跳过", field);
                table.unresolved.push(field.to_string());
                continue;
            };

            let index = numeric_suffix(field);
            let figure_field = format!("{}{}", schema.figure_prefix, index);
            let Some(figure_id) = record.str_field(&figure_field) else {
                warn!("标签 {} 没有对应的图片字段 {}，已跳过", field, figure_field);
                table.unresolved.push(field.to_string());
                continue;
            };

            let caption_field = format!("{}{}", schema.caption_prefix, index);
            let caption = record.str_field(&caption_field).unwrap_or_default();

            table.bindings.push(Binding {
                index,
                token: token.to_string(),
                figure_id: figure_id.to_string(),
                caption: caption.to_string(),
            });
        }

        table
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(value: serde_json::Value) -> Record {
        Record::from_value("k", &value).unwrap()
    }

    #[test]
    fn test_bindings_with_optional_caption() {
        let r = record(json!({
            "context": "See {fig:a} and {fig:b}.",
            "label1": "fig:a",
            "figure1": "chart_a",
            "caption1": "A chart.",
            "label2": "fig:b",
            "figure2": "chart_b"
        }));
        let table = ReferenceTable::from_record(&r, &RecordSchema::default());

        assert_eq!(table.len(), 2);
        assert_eq!(table.bindings[0].figure_id, "chart_a");
        assert_eq!(table.bindings[0].caption, "A chart.");
        assert_eq!(table.bindings[0].placeholder(), "{fig:a}");
        assert_eq!(table.bindings[1].caption, "");
        assert!(table.unresolved.is_empty());
    }

    #[test]
    fn test_missing_figure_is_skipped() {
        let r = record(json!({
            "context": "See {x}.",
            "label1": "x",
            "label2": "y",
            "figure2": "fig_y"
        }));
        let table = ReferenceTable::from_record(&r, &RecordSchema::default());

        assert_eq!(table.len(), 1);
        assert_eq!(table.bindings[0].index, "2");
        assert_eq!(table.unresolved, vec!["label1"]);
    }

    #[test]
    fn test_no_labels() {
        let r = record(json!({"context": "plain"}));
        assert!(ReferenceTable::from_record(&r, &RecordSchema::default()).is_empty());
    }
}
