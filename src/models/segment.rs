use serde::{Deserialize, Serialize};

/// 序列中的一段
///
/// 序列化格式与模型输入一致：`{"type": "text", "content": "..."}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "content", rename_all = "lowercase")]
pub enum Segment {
    Text(String),
    /// 图片路径（根目录 + 图片 ID + 扩展名）
    Image(String),
    Caption(String),
}

impl Segment {
    pub fn is_image(&self) -> bool {
        matches!(self, Segment::Image(_))
    }

    pub fn content(&self) -> &str {
        match self {
            Segment::Text(s) | Segment::Image(s) | Segment::Caption(s) => s,
        }
    }
}

/// 由一条记录构建的多模态输入序列
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sequence {
    pub segments: Vec<Segment>,
    /// 目标图片在所有图片中的序号（从 1 开始）；没有图片时为 `None`
    pub target_order: Option<usize>,
    /// 末尾追加的参考字段段数（不属于正文）
    #[serde(default)]
    pub appended: usize,
}

impl Sequence {
    pub fn image_count(&self) -> usize {
        self.segments.iter().filter(|s| s.is_image()).count()
    }

    pub fn image_paths(&self) -> impl Iterator<Item = &str> {
        self.segments.iter().filter_map(|s| match s {
            Segment::Image(path) => Some(path.as_str()),
            _ => None,
        })
    }

    /// 正文部分（去掉末尾追加段）
    pub fn document_segments(&self) -> &[Segment] {
        let end = self.segments.len().saturating_sub(self.appended);
        &self.segments[..end]
    }

    /// 末尾追加的参考段
    pub fn appended_segments(&self) -> &[Segment] {
        let start = self.segments.len().saturating_sub(self.appended);
        &self.segments[start..]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_segment_wire_format() {
        let json = serde_json::to_string(&Segment::Image("imgs/a.jpg".to_string())).unwrap();
        assert_eq!(json, r#"{"type":"image","content":"imgs/a.jpg"}"#);
    }

    #[test]
    fn test_document_and_appended_split() {
        let seq = Sequence {
            segments: vec![
                Segment::Text("body".to_string()),
                Segment::Image("a.jpg".to_string()),
                Segment::Text("<summary>s<summary/>".to_string()),
            ],
            target_order: Some(1),
            appended: 1,
        };
        assert_eq!(seq.document_segments().len(), 2);
        assert_eq!(seq.appended_segments().len(), 1);
        assert_eq!(seq.image_count(), 1);
    }
}
