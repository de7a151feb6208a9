use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use anafig_batch::utils::logging;
use anafig_batch::{App, Config, Task};

/// 图表摘要批量生成 / 评分工具
#[derive(Debug, Parser)]
#[command(name = "anafig-batch", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// 为每条记录生成图表摘要
    Generate(RunArgs),
    /// 对照参考摘要给生成的摘要打分
    Score(RunArgs),
}

#[derive(Debug, Args)]
struct RunArgs {
    /// 输入数据集（JSON 对象，key 为记录 ID）
    #[arg(long)]
    file: PathBuf,

    /// 模型名称
    #[arg(long)]
    model: Option<String>,

    /// API Key
    #[arg(long)]
    api_key: Option<String>,

    /// API 地址
    #[arg(long)]
    api_link: Option<String>,

    /// TOML 配置文件
    #[arg(long)]
    config: Option<PathBuf>,

    /// 输出目录
    #[arg(long)]
    output_dir: Option<String>,
}

impl RunArgs {
    /// 命令行参数优先于配置文件和环境变量
    fn into_config(self) -> Result<(Config, PathBuf)> {
        let mut config = Config::load(self.config.as_deref()).context("加载配置失败")?;

        if let Some(model) = self.model {
            config.llm_model_name = model;
        }
        if let Some(api_key) = self.api_key {
            config.llm_api_key = api_key;
        }
        if let Some(api_link) = self.api_link {
            config.llm_api_base_url = api_link;
        }
        if let Some(output_dir) = self.output_dir {
            config.output_dir = output_dir;
        }

        Ok((config, self.file))
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let (task, args) = match cli.command {
        Command::Generate(args) => (Task::Summarize, args),
        Command::Score(args) => (Task::Score, args),
    };
    let (config, input) = args.into_config()?;

    // 初始化日志
    logging::init(config.verbose_logging);

    // 初始化并运行应用
    let app = App::initialize(config, task, input).await?;
    app.listen_for_ctrl_c();
    app.run().await?;

    Ok(())
}
