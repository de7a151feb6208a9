use crate::error::AppResult;
use crate::models::loaders::{load_dataset, save_dataset};
use crate::models::record::Record;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};
use std::path::Path;

/// 数据集：记录 ID → 记录
///
/// 依赖 `serde_json` 的 `preserve_order`，保存时键顺序与读入时一致。
/// 运行期间由编排器独占，只会给记录追加输出字段，不会删除记录。
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Dataset {
    records: Map<String, JsonValue>,
}

impl Dataset {
    pub fn new(records: Map<String, JsonValue>) -> Self {
        Self { records }
    }

    pub async fn load(path: &Path) -> AppResult<Self> {
        load_dataset(path).await
    }

    /// 原子写入（临时文件 + 重命名）
    pub async fn save(&self, path: &Path) -> AppResult<()> {
        save_dataset(self, path).await
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// 按文件顺序返回所有键
    pub fn keys(&self) -> Vec<String> {
        self.records.keys().cloned().collect()
    }

    pub fn raw(&self, key: &str) -> Option<&JsonValue> {
        self.records.get(key)
    }

    /// 取出一条记录的副本
    pub fn record(&self, key: &str) -> Option<AppResult<Record>> {
        self.records
            .get(key)
            .map(|value| Record::from_value(key, value))
    }

    /// 读取记录的某个字符串字段
    pub fn field(&self, key: &str, field: &str) -> Option<&str> {
        self.records
            .get(key)
            .and_then(|v| v.get(field))
            .and_then(|v| v.as_str())
    }

    /// 写入记录的某个字段
    ///
    /// 非对象记录无法追加字段，保持原样并返回 `false`。
    pub fn set_field(&mut self, key: &str, field: &str, value: impl Into<JsonValue>) -> bool {
        match self.records.get_mut(key) {
            Some(JsonValue::Object(map)) => {
                map.insert(field.to_string(), value.into());
                true
            }
            _ => false,
        }
    }

    pub fn to_pretty_json(&self) -> AppResult<String> {
        Ok(serde_json::to_string_pretty(&self.records)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_key_order_preserved() {
        let dataset: Dataset =
            serde_json::from_str(r#"{"z": {"a": 1}, "a": {"a": 2}, "m": {"a": 3}}"#).unwrap();
        assert_eq!(dataset.keys(), vec!["z", "a", "m"]);

        let out = dataset.to_pretty_json().unwrap();
        let z = out.find("\"z\"").unwrap();
        let a = out.find("\"a\": {").unwrap();
        assert!(z < a);
    }

    #[test]
    fn test_set_field_on_non_object() {
        let mut dataset = Dataset::new(
            json!({"ok": {"context": "x"}, "bad": "text"})
                .as_object()
                .unwrap()
                .clone(),
        );
        assert!(dataset.set_field("ok", "summary_pre", "s"));
        assert!(!dataset.set_field("bad", "summary_pre", "s"));
        assert!(!dataset.set_field("missing", "summary_pre", "s"));
        assert_eq!(dataset.field("ok", "summary_pre"), Some("s"));
        assert_eq!(dataset.len(), 2);
    }
}
