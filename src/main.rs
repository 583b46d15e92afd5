use std::path::Path;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::task::spawn_blocking;
use tracing::{error, info, warn};

use pdf_translate_batch::cli::{Cli, Commands, MergeArgs, RunArgs};
use pdf_translate_batch::services::{Reassembler, Reconciler};
use pdf_translate_batch::utils::logging;
use pdf_translate_batch::{App, Config, RunReport};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // 加载配置：默认值 → 配置文件 → 环境变量 → 命令行
    let mut config = Config::load(cli.config.as_deref())?;
    cli.apply_overrides(&mut config);
    config.validate()?;

    // 初始化日志
    logging::init_log_file(&config.output_log_file)?;
    logging::init(config.verbose_logging, Some(config.output_log_file.as_path()))?;

    let command = cli.command.unwrap_or(Commands::Run(RunArgs::default()));
    let result = match command {
        Commands::Run(args) => handle_run(config, &args).await,
        Commands::Split => handle_split(config).await,
        Commands::Merge(args) => handle_merge(&config, &args).await,
        Commands::Reconcile => handle_reconcile(&config).await,
    };

    match result {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            error!("运行失败: {:#}", e);
            std::process::exit(1);
        }
    }
}

async fn handle_run(config: Config, args: &RunArgs) -> Result<i32> {
    let log_file = config.output_log_file.clone();

    let report = if args.dry_run {
        App::offline(config).plan_only(false).await?
    } else {
        App::initialize(config).await?.run().await?
    };

    finish(&report, &log_file, args.report_json.as_deref())
}

async fn handle_split(config: Config) -> Result<i32> {
    let log_file = config.output_log_file.clone();
    let report = App::offline(config).plan_only(true).await?;
    finish(&report, &log_file, None)
}

async fn handle_merge(config: &Config, args: &MergeArgs) -> Result<i32> {
    let dir = args
        .dir
        .clone()
        .unwrap_or_else(|| config.staging_dir.clone());
    info!("🔗 合并目录: {}", dir.display());

    let scan_dir = dir.clone();
    let report = spawn_blocking(move || Reassembler::new().reassemble(&scan_dir))
        .await?
        .with_context(|| format!("无法扫描目录: {}", dir.display()))?;

    for (base, path) in &report.merged {
        info!("✅ {} → {}", base, path.display());
    }
    for (base, e) in &report.failed {
        warn!("❌ {}: {}", base, e);
    }
    Ok(if report.has_failures() { 1 } else { 0 })
}

async fn handle_reconcile(config: &Config) -> Result<i32> {
    let reconciler = Reconciler::new(
        config.staging_dir.clone(),
        config.working_dir.clone(),
        config.max_age,
    );
    let reconciled = spawn_blocking(move || reconciler.reconcile()).await?;

    let mut report = RunReport::new();
    report.record_reconcile(&reconciled);
    report.finish();
    finish(&report, &config.output_log_file, None)
}

fn finish(report: &RunReport, log_file: &Path, report_json: Option<&Path>) -> Result<i32> {
    logging::print_final_stats(report, log_file);

    if let Some(path) = report_json {
        std::fs::write(path, report.to_json()?)
            .with_context(|| format!("无法写入 {}", path.display()))?;
        info!("运行结果已写入: {}", path.display());
    }
    Ok(report.exit_code())
}
