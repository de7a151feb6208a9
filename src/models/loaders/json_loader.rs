use crate::error::{AppError, AppResult, FileError};
use crate::models::dataset::Dataset;
use serde_json::Value as JsonValue;
use std::path::{Path, PathBuf};
use tokio::fs;

/// 从 JSON 文件加载数据集
///
/// 顶层必须是以记录 ID 为键的对象。
pub async fn load_dataset(path: &Path) -> AppResult<Dataset> {
    let content = fs::read_to_string(path)
        .await
        .map_err(|e| AppError::file_read_failed(path.display().to_string(), e))?;

    let value: JsonValue =
        serde_json::from_str(&content).map_err(|e| FileError::JsonParseFailed {
            path: path.display().to_string(),
            source: e,
        })?;

    match value {
        JsonValue::Object(map) => {
            tracing::info!("成功加载 {} 条记录: {}", map.len(), path.display());
            Ok(Dataset::new(map))
        }
        _ => Err(FileError::NotAnObject {
            path: path.display().to_string(),
        }
        .into()),
    }
}

/// 把整个数据集写到 JSON 文件
///
/// 先写同目录下的临时文件再重命名，写到一半崩溃不会破坏上一次的检查点。
pub async fn save_dataset(dataset: &Dataset, path: &Path) -> AppResult<()> {
    let content = dataset.to_pretty_json()?;

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .await
            .map_err(|e| AppError::file_write_failed(parent.display().to_string(), e))?;
    }

    let tmp_path = temp_path_for(path);
    fs::write(&tmp_path, content)
        .await
        .map_err(|e| AppError::file_write_failed(tmp_path.display().to_string(), e))?;
    fs::rename(&tmp_path, path)
        .await
        .map_err(|e| AppError::file_write_failed(path.display().to_string(), e))?;

    Ok(())
}

fn temp_path_for(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_save_then_load_keeps_order_and_unicode() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("out.json");

        let dataset = Dataset::new(
            json!({
                "b": {"context": "图表说明"},
                "a": {"context": "x", "summary_pre": "s"}
            })
            .as_object()
            .unwrap()
            .clone(),
        );
        save_dataset(&dataset, &path).await.unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.contains("图表说明"));
        assert!(!path.with_file_name("out.json.tmp").exists());

        let loaded = load_dataset(&path).await.unwrap();
        assert_eq!(loaded.keys(), vec!["b", "a"]);
        assert_eq!(loaded, dataset);
    }

    #[tokio::test]
    async fn test_load_rejects_array_and_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("list.json");
        std::fs::write(&path, "[1, 2]").unwrap();

        assert!(load_dataset(&path).await.is_err());
        assert!(load_dataset(&dir.path().join("none.json")).await.is_err());
    }
}
