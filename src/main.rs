mod config;
mod crawler;
mod parser;
mod storage;
mod utils;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::{info, warn};

use crate::config::{AppConfig, DEFAULT_CONFIG_PATH};
use crawler::HttpFetcher;
use parser::ExtractionPipeline;
use storage::StoreFile;
use utils::logger;

#[derive(Parser)]
#[command(name = "yamolbot")]
#[command(about = "考古题页面解析：题目、选项、答案、图片与讨论", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// 生成默认配置文件
    Init,
    /// 解析一份已下载的题目页面并合并进题库
    Parse {
        /// 题目页面 HTML 文件
        #[arg(short, long)]
        input: PathBuf,
        /// 题库 JSON 路径，图片与讨论写入同目录的 static/
        #[arg(short, long)]
        store: PathBuf,
    },
    /// 查看题库内容
    Show {
        /// 题库 JSON 路径
        #[arg(short, long)]
        store: PathBuf,
        /// 只显示指定题号
        #[arg(long)]
        id: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    logger::init_logger();

    let cli = Cli::parse();

    match cli.command {
        Commands::Init => init_command().await?,
        Commands::Parse { input, store } => parse_command(input, store).await?,
        Commands::Show { store, id } => show_command(store, id)?,
    }

    Ok(())
}

async fn init_command() -> Result<()> {
    tokio::fs::create_dir_all("config").await?;

    let app_config = AppConfig::default();
    app_config.save(DEFAULT_CONFIG_PATH)?;
    info!("已生成配置文件: {}", DEFAULT_CONFIG_PATH);
    Ok(())
}

async fn parse_command(input: PathBuf, store: PathBuf) -> Result<()> {
    let app_config = AppConfig::load()?;
    let html = tokio::fs::read_to_string(&input)
        .await
        .with_context(|| format!("读取页面失败: {}", input.display()))?;
    info!("解析页面: {} ({} 字节)", input.display(), html.len());

    let pipeline = ExtractionPipeline::new(&app_config)?;
    let fetcher = HttpFetcher::new(&app_config.fetch)?;
    let report = pipeline.run(&html, &store, &fetcher).await?;

    if report.warnings.is_empty() {
        info!("✅ 完成: {} 道题", report.records);
    } else {
        warn!(
            "完成: {} 道题，{} 条警告",
            report.records,
            report.warnings.len()
        );
    }

    println!("{}", serde_json::to_string(&report.location)?);
    Ok(())
}

fn show_command(store: PathBuf, id: Option<String>) -> Result<()> {
    let file = StoreFile::new(store);
    let records = file.load()?;

    if let Some(id) = id {
        match records.get(&id) {
            Some(record) => println!("{}", serde_json::to_string_pretty(record)?),
            None => warn!("题库中没有题号 {}", id),
        }
        return Ok(());
    }

    println!("{:>6} | {:^4} | {:>4} | {:>4} | 题干", "题号", "答案", "选项", "图片");
    println!("{}", "-".repeat(60));
    for (id, record) in &records {
        let question: String = record.question.chars().take(30).collect();
        println!(
            "{:>6} | {:^4} | {:>4} | {:>4} | {}",
            id,
            record.answer,
            record.choices.len(),
            record.images.as_ref().map(|i| i.len()).unwrap_or(0),
            question
        );
    }
    println!("\n共 {} 题: {}", records.len(), file.path().display());
    Ok(())
}
