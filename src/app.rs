//! 应用入口 - 把配置、后端、流程和编排层组装起来
//!
//! ## 文件约定
//!
//! ```text
//! 生成: <output_dir>/summary_pre/<stem>_<model>_gen.json
//! 评分: <output_dir>/score/<stem>-<model>_score.json
//! 错误: 与输出同目录的 <stem>_<model>_errors.txt
//! ```
//!
//! 输出文件已存在时从输出文件继续（断点续跑），否则从输入文件开始。

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};

use crate::backend::{
    Backend, DataUrlEncoder, ImageEncoder, OpenAiBackend, PassthroughEncoder, Task,
};
use crate::config::Config;
use crate::models::Dataset;
use crate::orchestrator::{BatchProcessor, CancelFlag, JsonFileSink, RunReport};
use crate::sequence::{SequenceBuilder, SequenceConfig};
use crate::utils::logging::{append_log_line, init_log_file, log_startup, print_final_stats};
use crate::workflow::RecordFlow;

/// 应用主结构
pub struct App {
    config: Config,
    task: Task,
    input_path: PathBuf,
    output_path: PathBuf,
    errors_path: PathBuf,
    backend: Arc<dyn Backend>,
    cancel: CancelFlag,
}

impl App {
    /// 初始化应用，使用 OpenAI 兼容后端
    pub async fn initialize(config: Config, task: Task, input_path: PathBuf) -> Result<Self> {
        let encoder: Arc<dyn ImageEncoder> = if is_remote(&config.image_root) {
            Arc::new(PassthroughEncoder)
        } else {
            Arc::new(DataUrlEncoder)
        };
        let backend = Arc::new(OpenAiBackend::new(&config, task, encoder));

        let app = Self::with_backend(config, task, input_path, backend);
        init_log_file(&app.config.output_log_file, &format!("{}日志", task))
            .with_context(|| format!("无法创建日志文件: {}", app.config.output_log_file))?;

        Ok(app)
    }

    /// 使用指定后端创建应用（不创建日志文件）
    pub fn with_backend(
        config: Config,
        task: Task,
        input_path: PathBuf,
        backend: Arc<dyn Backend>,
    ) -> Self {
        let model = backend.model_name().to_string();
        let output_path = output_path(task, Path::new(&config.output_dir), &input_path, &model);
        let errors_path = errors_path(&output_path, &input_path, &model);

        Self {
            config,
            task,
            input_path,
            output_path,
            errors_path,
            backend,
            cancel: CancelFlag::new(),
        }
    }

    pub fn output_path(&self) -> &Path {
        &self.output_path
    }

    pub fn errors_path(&self) -> &Path {
        &self.errors_path
    }

    pub fn cancel_flag(&self) -> CancelFlag {
        self.cancel.clone()
    }

    /// 收到 Ctrl-C 时设置取消标志
    pub fn listen_for_ctrl_c(&self) {
        let cancel = self.cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("⚠️ 收到 Ctrl-C，当前记录完成后停止");
                cancel.cancel();
            }
        });
    }

    /// 运行应用主逻辑
    pub async fn run(&self) -> Result<RunReport> {
        log_startup(
            &self.task.to_string(),
            self.backend.model_name(),
            &self.input_path.display().to_string(),
            &self.output_path.display().to_string(),
        );

        let mut dataset = self.load_dataset().await?;

        let builder = SequenceBuilder::new(SequenceConfig::from_config(
            &self.config,
            self.task.appended_fields(),
        ))
        .context("无法创建序列构建器")?;
        let flow = RecordFlow::new(builder, Arc::clone(&self.backend), &self.config)
            .with_prerequisite(self.task.prerequisite_field());

        let processor = BatchProcessor::new(
            flow,
            Arc::new(JsonFileSink::new(&self.output_path)),
            self.task.output_field(),
        )
        .with_checkpoint_interval(self.config.checkpoint_interval)
        .with_max_concurrent(self.config.max_concurrent_records)
        .with_cancel_flag(self.cancel.clone());

        let report = processor
            .run(&mut dataset)
            .await
            .with_context(|| format!("保存检查点失败: {}", self.output_path.display()))?;

        self.write_errors(&report).await?;
        print_final_stats(&report, &self.config.output_log_file);
        append_log_line(
            &self.config.output_log_file,
            &format!(
                "[{}] {} 成功 {} / 失败 {} / 跳过 {} / 已完成 {}{}",
                chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
                self.output_path.display(),
                report.succeeded,
                report.failed(),
                report.skipped_other,
                report.skipped_done,
                if report.cancelled { " (已取消)" } else { "" }
            ),
        )
        .with_context(|| format!("无法写入日志文件: {}", self.config.output_log_file))?;

        Ok(report)
    }

    /// 输出文件存在时续跑，否则读取输入文件
    async fn load_dataset(&self) -> Result<Dataset> {
        let source = if tokio::fs::try_exists(&self.output_path)
            .await
            .unwrap_or(false)
        {
            info!("📂 发现已有输出，继续处理: {}", self.output_path.display());
            &self.output_path
        } else {
            info!("📂 读取输入文件: {}", self.input_path.display());
            &self.input_path
        };

        Dataset::load(source)
            .await
            .with_context(|| format!("无法加载数据集: {}", source.display()))
    }

    /// 错误列表始终与本次输出一致：没有失败时删除旧的列表
    async fn write_errors(&self, report: &RunReport) -> Result<()> {
        if report.failed_keys.is_empty() {
            return match tokio::fs::remove_file(&self.errors_path).await {
                Ok(()) => {
                    info!("🧹 已删除过期的错误列表: {}", self.errors_path.display());
                    Ok(())
                }
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
                Err(e) => Err(e).with_context(|| {
                    format!("无法删除错误列表: {}", self.errors_path.display())
                }),
            };
        }

        let mut content = report.failed_keys.join("\n");
        content.push('\n');
        tokio::fs::write(&self.errors_path, content)
            .await
            .with_context(|| format!("无法写入错误列表: {}", self.errors_path.display()))?;

        warn!(
            "⚠️ {} 条记录失败，已写入 {}",
            report.failed_keys.len(),
            self.errors_path.display()
        );
        Ok(())
    }
}

/// 模型名里的 `/` 不能出现在文件名中
fn model_tag(model: &str) -> String {
    model.replace('/', "_")
}

fn input_stem(input: &Path) -> String {
    input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "dataset".to_string())
}

/// 计算输出文件路径
pub fn output_path(task: Task, output_dir: &Path, input: &Path, model: &str) -> PathBuf {
    let stem = input_stem(input);
    let model = model_tag(model);
    match task {
        Task::Summarize => output_dir
            .join(task.output_field())
            .join(format!("{}_{}_{}.json", stem, model, task.file_suffix())),
        Task::Score => output_dir
            .join(task.output_field())
            .join(format!("{}-{}_{}.json", stem, model, task.file_suffix())),
    }
}

/// 错误列表文件，与输出文件同目录
pub fn errors_path(output_path: &Path, input: &Path, model: &str) -> PathBuf {
    let name = format!("{}_{}_errors.txt", input_stem(input), model_tag(model));
    match output_path.parent() {
        Some(dir) => dir.join(name),
        None => PathBuf::from(name),
    }
}

fn is_remote(image_root: &str) -> bool {
    image_root.starts_with("http://") || image_root.starts_with("https://")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_paths() {
        let input = Path::new("data/test_all.json");
        let out = Path::new("output");

        assert_eq!(
            output_path(Task::Summarize, out, input, "Qwen/Qwen2-VL-7B"),
            PathBuf::from("output/summary_pre/test_all_Qwen_Qwen2-VL-7B_gen.json")
        );
        assert_eq!(
            output_path(Task::Score, out, input, "gpt-4o"),
            PathBuf::from("output/score/test_all-gpt-4o_score.json")
        );
    }

    #[test]
    fn test_errors_path_next_to_output() {
        let output = PathBuf::from("output/score/test_all-gpt-4o_score.json");
        assert_eq!(
            errors_path(&output, Path::new("test_all.json"), "gpt-4o"),
            PathBuf::from("output/score/test_all_gpt-4o_errors.txt")
        );
    }

    #[test]
    fn test_is_remote() {
        assert!(is_remote("https://cdn.example.com/imgs/"));
        assert!(!is_remote("images/AnaFig-image/main-images"));
    }
}
