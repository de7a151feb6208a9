//! 目标图片定位

use crate::models::segment::Segment;

/// 判断图片路径是否对应目标图片 ID
///
/// 目前按子串匹配 `图片 ID + 扩展名`，与路径拼接方式一致。
/// 共享前缀的 ID（`fig_1` / `fig_10`）靠扩展名区分；目录名里出现同样的串时仍可能误判。
pub fn figure_matches(path: &str, target_id: &str, extension: &str) -> bool {
    if target_id.is_empty() {
        return false;
    }
    path.contains(&format!("{}{}", target_id, extension))
}

/// 计算目标图片在所有图片段中的序号（从 1 开始）
///
/// - 没有图片段：`None`
/// - 未指定目标或没有匹配：默认第 1 张
pub fn locate_target(segments: &[Segment], target_id: Option<&str>, extension: &str) -> Option<usize> {
    let mut image_order = 0;
    let mut found = None;

    for segment in segments {
        if let Segment::Image(path) = segment {
            image_order += 1;
            if found.is_none() {
                if let Some(target) = target_id {
                    if figure_matches(path, target, extension) {
                        found = Some(image_order);
                    }
                }
            }
        }
    }

    if image_order == 0 {
        None
    } else {
        Some(found.unwrap_or(1))
    }
}
