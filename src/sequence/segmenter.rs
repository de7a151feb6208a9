//! 分段
//!
//! 按分隔符切分替换后的文本，得到有序的 text / image / caption 段。

use crate::models::segment::Segment;
use crate::sequence::resolver::{
    unescape_boundary, BOUNDARY, CAPTION_CLOSE, CAPTION_OPEN, FIGURE_CLOSE, FIGURE_OPEN,
    TEXT_CLOSE, TEXT_OPEN,
};

pub struct Segmenter {
    image_extension: String,
    /// 图注单独成段；关闭时图注作为普通文本段输出
    emit_caption_as_separate_segment: bool,
}

impl Segmenter {
    pub fn new(image_extension: impl Into<String>, emit_caption_as_separate_segment: bool) -> Self {
        Self {
            image_extension: image_extension.into(),
            emit_caption_as_separate_segment,
        }
    }

    pub fn segment(&self, resolved: &str) -> Vec<Segment> {
        resolved
            .split(BOUNDARY)
            .filter_map(|fragment| self.classify(&unescape_boundary(fragment)))
            .collect()
    }

    fn classify(&self, fragment: &str) -> Option<Segment> {
        let trimmed = fragment.trim();
        if trimmed.is_empty() {
            return None;
        }

        let path = strip_markers(trimmed, &[FIGURE_OPEN, FIGURE_CLOSE]);
        let path = path.trim();
        if path.ends_with(&self.image_extension) {
            return Some(Segment::Image(path.to_string()));
        }

        if trimmed.contains(CAPTION_OPEN) {
            let caption = strip_markers(
                trimmed,
                &[CAPTION_OPEN, CAPTION_CLOSE, TEXT_OPEN, TEXT_CLOSE],
            );
            let caption = caption.trim();
            if caption.is_empty() {
                return None;
            }
            return Some(if self.emit_caption_as_separate_segment {
                Segment::Caption(caption.to_string())
            } else {
                Segment::Text(caption.to_string())
            });
        }

        let text = strip_markers(trimmed, &[TEXT_OPEN, TEXT_CLOSE]);
        let text = text.trim();
        if text.is_empty() {
            None
        } else {
            Some(Segment::Text(text.to_string()))
        }
    }
}

fn strip_markers(fragment: &str, markers: &[&str]) -> String {
    markers
        .iter()
        .fold(fragment.to_string(), |acc, marker| acc.replace(marker, ""))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(s: &str) -> Segment {
        Segment::Text(s.to_string())
    }

    #[test]
    fn test_worked_example() {
        let segmenter = Segmenter::new(".jpg", true);
        let segments = segmenter.segment(
            "<text>See <text/>|imgs/chart_a.jpg|<caption>A chart.<caption/>|<text>.<text/>",
        );
        assert_eq!(
            segments,
            vec![
                text("See"),
                Segment::Image("imgs/chart_a.jpg".to_string()),
                Segment::Caption("A chart.".to_string()),
                text("."),
            ]
        );
    }

    #[test]
    fn test_caption_as_text_when_not_separate() {
        let segmenter = Segmenter::new(".jpg", false);
        let segments = segmenter.segment("|a.jpg|<caption>Cap<caption/>|");
        assert_eq!(
            segments,
            vec![Segment::Image("a.jpg".to_string()), text("Cap")]
        );
    }

    #[test]
    fn test_empty_caption_and_whitespace_dropped() {
        let segmenter = Segmenter::new(".jpg", true);
        let segments = segmenter.segment("<text>  <text/>|a.jpg|<caption><caption/>|   ");
        assert_eq!(segments, vec![Segment::Image("a.jpg".to_string())]);
    }

    #[test]
    fn test_figure_wrapper_stripped() {
        let segmenter = Segmenter::new(".jpg", true);
        let segments = segmenter.segment("<figure>imgs/x.jpg<figure/>");
        assert_eq!(segments, vec![Segment::Image("imgs/x.jpg".to_string())]);
    }

    #[test]
    fn test_plain_text_single_segment() {
        let segmenter = Segmenter::new(".jpg", true);
        assert_eq!(
            segmenter.segment("<text>just words<text/>"),
            vec![text("just words")]
        );
    }
}
