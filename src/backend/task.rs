//! 任务类型
//!
//! 生成摘要和给摘要打分共用同一套序列构建和批处理，只在输出字段、追加字段和系统提示词上不同。

use crate::sequence::AppendedField;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Task {
    /// 生成图表摘要，写入 `summary_pre`
    Summarize,
    /// 对照参考摘要给生成摘要打分，写入 `score`
    Score,
}

impl Task {
    /// 结果写入的字段
    pub fn output_field(&self) -> &'static str {
        match self {
            Task::Summarize => "summary_pre",
            Task::Score => "score",
        }
    }

    /// 处理前必须已经存在的字段；缺失的记录直接跳过
    pub fn prerequisite_field(&self) -> Option<&'static str> {
        match self {
            Task::Summarize => None,
            Task::Score => Some("summary_pre"),
        }
    }

    /// 追加在序列末尾的参考字段
    pub fn appended_fields(&self) -> Vec<AppendedField> {
        match self {
            Task::Summarize => Vec::new(),
            Task::Score => vec![
                AppendedField::required("summary", "reference summary"),
                AppendedField::required("summary_pre", "summary"),
            ],
        }
    }

    /// 系统提示词，`target_order` 为目标图片序号
    pub fn system_prompt(&self, target_order: usize) -> String {
        match self {
            Task::Summarize => format!(
                "Generate a chart summary based on: \
                 1. Figures (focus on the specified one), \
                 2. Chart titles/captions, \
                 3. Related text descriptions. \
                 Focus exclusively on figure {}. \
                 Generate concise English summary (<200 words) in a single paragraph. \
                 Ensure faithfulness, completeness, conciseness, logicality, and analysis depth.",
                target_order
            ),
            Task::Score => format!(
                "Evaluate the summary of figure {} against the reference summary:\n\
                 1. Faithfulness: Strict adherence to figure and supplementary content (5-point scale)\n\
                 2. Completeness: Coverage of all key information (5-point scale)\n\
                 3. Conciseness: Brevity and clarity (5-point scale)\n\
                 4. Logicality: Logical coherence and expert knowledge (5-point scale)\n\
                 5. Analysis: Depth of understanding and interpretation (5-point scale)\n\n\
                 Output format: 'Faithfulness (X/5); Completeness (X/5); Conciseness (X/5); \
                 Logicality (X/5); Analysis (X/5)'",
                target_order
            ),
        }
    }

    /// 输出文件名后缀
    pub fn file_suffix(&self) -> &'static str {
        match self {
            Task::Summarize => "gen",
            Task::Score => "score",
        }
    }
}

impl fmt::Display for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Task::Summarize => write!(f, "摘要生成"),
            Task::Score => write!(f, "摘要评分"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_mentions_target() {
        assert!(Task::Summarize.system_prompt(3).contains("figure 3"));
        assert!(Task::Score.system_prompt(2).contains("figure 2"));
    }

    #[test]
    fn test_score_requires_summaries() {
        assert_eq!(Task::Score.prerequisite_field(), Some("summary_pre"));
        assert_eq!(Task::Score.appended_fields().len(), 2);
        assert!(Task::Summarize.appended_fields().is_empty());
    }
}
