//! 引用替换
//!
//! 把正文中的 `{label}` 换成结构化标记：
//!
//! ```text
//! <text/>|images/chart_a.jpg|<caption>A chart.<caption/>|<text>
//! ```
//!
//! 替换只在原位置进行，所以替换后的图片顺序就是正文中的引用顺序。

use crate::error::AppResult;
use crate::sequence::reference::ReferenceTable;
use regex::Regex;

pub const BOUNDARY: char = '|';
/// 正文、图注中原有的 `|` 在替换期间换成这个私用区字符，分段后再还原
pub const ESCAPED_BOUNDARY: char = '\u{E000}';
pub const TEXT_OPEN: &str = "<text>";
pub const TEXT_CLOSE: &str = "<text/>";
pub const CAPTION_OPEN: &str = "<caption>";
pub const CAPTION_CLOSE: &str = "<caption/>";
pub const FIGURE_OPEN: &str = "<figure>";
pub const FIGURE_CLOSE: &str = "<figure/>";

/// 残留的 LaTeX 命令：`\label`、`\xxxref`、`\ref`、`\fig`
const RESIDUAL_MARKUP: &str = r"\\(label|[a-zA-Z]+ref|ref|fig)";

/// 拼接图片路径：根目录 + 图片 ID + 扩展名
///
/// 根目录不以 `/` 结尾时补一个 `/`。
pub fn image_path(root: &str, figure_id: &str, extension: &str) -> String {
    if root.is_empty() || root.ends_with('/') {
        format!("{}{}{}", root, figure_id, extension)
    } else {
        format!("{}/{}{}", root, figure_id, extension)
    }
}

/// 把输入中的 `|` 换掉，只留下替换时插入的分隔符
pub fn escape_boundary(text: &str) -> String {
    text.replace(BOUNDARY, &ESCAPED_BOUNDARY.to_string())
}

pub fn unescape_boundary(text: &str) -> String {
    text.replace(ESCAPED_BOUNDARY, &BOUNDARY.to_string())
}

pub struct Resolver {
    image_root: String,
    image_extension: String,
    residual_markup: Regex,
}

impl Resolver {
    pub fn new(image_root: impl Into<String>, image_extension: impl Into<String>) -> AppResult<Self> {
        Ok(Self {
            image_root: image_root.into(),
            image_extension: image_extension.into(),
            residual_markup: Regex::new(RESIDUAL_MARKUP)?,
        })
    }

    pub fn image_extension(&self) -> &str {
        &self.image_extension
    }

    /// 替换正文中的所有引用并清理残留标记
    ///
    /// 没有任何标签时只做清理，不会失败。
    /// 输出中原文的 `|` 以 [`ESCAPED_BOUNDARY`] 出现，由分段器还原。
    pub fn resolve(&self, body: &str, table: &ReferenceTable) -> String {
        let mut rich_text = format!("{}{}{}", TEXT_OPEN, escape_boundary(body), TEXT_CLOSE);

        for binding in &table.bindings {
            let placeholder = escape_boundary(&binding.placeholder());
            if !rich_text.contains(&placeholder) {
                continue;
            }
            let path = escape_boundary(&image_path(
                &self.image_root,
                &binding.figure_id,
                &self.image_extension,
            ));
            let marker = format!(
                "{close}{b}{path}{b}{c_open}{caption}{c_close}{b}{open}",
                close = TEXT_CLOSE,
                b = BOUNDARY,
                path = path,
                c_open = CAPTION_OPEN,
                caption = escape_boundary(&binding.caption),
                c_close = CAPTION_CLOSE,
                open = TEXT_OPEN,
            );
            rich_text = rich_text.replace(&placeholder, &marker);
        }

        self.clean(&rich_text)
    }

    /// 去掉残留命令、空文本对和重复的分隔符
    fn clean(&self, rich_text: &str) -> String {
        let mut cleaned = self
            .residual_markup
            .replace_all(rich_text, "")
            .replace(&format!("{}{}", TEXT_OPEN, TEXT_CLOSE), "");

        let doubled = format!("{0}{0}", BOUNDARY);
        while cleaned.contains(&doubled) {
            cleaned = cleaned.replace(&doubled, &BOUNDARY.to_string());
        }
        cleaned
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::record::{Record, RecordSchema};
    use serde_json::json;

    fn resolve(value: serde_json::Value, root: &str) -> String {
        let record = Record::from_value("k", &value).unwrap();
        let schema = RecordSchema::default();
        let table = ReferenceTable::from_record(&record, &schema);
        let resolver = Resolver::new(root, ".jpg").unwrap();
        resolver.resolve(record.body(&schema).unwrap(), &table)
    }

    #[test]
    fn test_image_path_join() {
        assert_eq!(image_path("imgs/", "a", ".jpg"), "imgs/a.jpg");
        assert_eq!(image_path("imgs", "a", ".jpg"), "imgs/a.jpg");
        assert_eq!(image_path("", "a", ".png"), "a.png");
    }

    #[test]
    fn test_single_reference() {
        let out = resolve(
            json!({
                "context": "See {f1}.",
                "label1": "f1",
                "figure1": "chart_a",
                "caption1": "A chart."
            }),
            "imgs/",
        );
        assert_eq!(
            out,
            "<text>See <text/>|imgs/chart_a.jpg|<caption>A chart.<caption/>|<text>.<text/>"
        );
    }

    #[test]
    fn test_no_labels_strips_markup_only() {
        let out = resolve(json!({"context": r"As shown in \ref and \label here"}), "imgs/");
        assert_eq!(out, "<text>As shown in  and  here<text/>");
    }

    #[test]
    fn test_latex_ref_commands_removed_around_reference() {
        let out = resolve(
            json!({
                "context": r"Figure \autoref{fig:x} shows it",
                "label1": "fig:x",
                "figure1": "x"
            }),
            "root",
        );
        assert_eq!(
            out,
            "<text>Figure <text/>|root/x.jpg|<caption><caption/>|<text> shows it<text/>"
        );
    }

    #[test]
    fn test_reference_at_start_drops_empty_text() {
        let out = resolve(
            json!({"context": "{a}{b}", "label1": "a", "figure1": "fa", "label2": "b", "figure2": "fb"}),
            "",
        );
        assert_eq!(
            out,
            "|fa.jpg|<caption><caption/>|fb.jpg|<caption><caption/>|"
        );
    }

    #[test]
    fn test_token_not_in_body_is_ignored() {
        let out = resolve(
            json!({"context": "nothing", "label1": "absent", "figure1": "fa"}),
            "",
        );
        assert_eq!(out, "<text>nothing<text/>");
    }

    #[test]
    fn test_literal_pipes_survive_cleaning() {
        let out = resolve(json!({"context": "The norm |x| is bounded || here."}), "");
        assert!(!out.contains(BOUNDARY));
        assert_eq!(
            unescape_boundary(&out),
            "<text>The norm |x| is bounded || here.<text/>"
        );
    }
}
