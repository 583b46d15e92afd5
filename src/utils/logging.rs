/// 日志工具模块
///
/// 初始化 tracing 订阅器，并提供横幅式的日志输出辅助函数
use std::fs::{self, File};
use std::path::Path;
use std::sync::Mutex;

use anyhow::{Context, Result};
use tracing::{info, warn};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

use crate::config::Config;
use crate::orchestrator::report::RunReport;

/// 初始化日志订阅器
///
/// `RUST_LOG` 优先；未设置时默认 `info`，`verbose` 为真时 `debug`。
/// 指定 `log_file` 时同时以纯文本追加写入该文件。
pub fn init(verbose: bool, log_file: Option<&Path>) -> Result<()> {
    let default_level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let file_layer = match log_file {
        Some(path) => {
            let file = File::options()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("无法打开日志文件: {}", path.display()))?;
            Some(
                fmt::layer()
                    .with_ansi(false)
                    .with_target(false)
                    .with_writer(Mutex::new(file)),
            )
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false))
        .with(file_layer)
        .try_init()
        .context("日志系统已初始化")?;
    Ok(())
}

/// 初始化日志文件（覆盖旧内容，写入时间戳标题）
pub fn init_log_file(log_file_path: &Path) -> Result<()> {
    let log_header = format!(
        "{}\nPDF 翻译日志 - {}\n{}\n\n",
        "=".repeat(60),
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
        "=".repeat(60)
    );
    fs::write(log_file_path, log_header)
        .with_context(|| format!("无法写入日志文件: {}", log_file_path.display()))?;
    Ok(())
}

/// 记录程序启动信息
pub fn log_startup(config: &Config) {
    info!("{}", "=".repeat(60));
    info!("🚀 程序启动 - PDF 批量翻译");
    info!("📂 工作目录: {}", config.working_dir.display());
    info!("📥 暂存目录: {}", config.staging_dir.display());
    info!(
        "✂️ 拆分阈值: {} 页 / {} MiB",
        config.max_pages,
        config.max_size_bytes / (1024 * 1024)
    );
    info!("📊 最大并发数: {}", config.max_concurrent_units);
    info!("{}", "=".repeat(60));
}

/// 列出本轮要提交的单元
pub fn log_units_planned(paths: &[impl AsRef<Path>], max_concurrent: usize) {
    info!("📋 需要翻译的文件 ({} 个):", paths.len());
    for path in paths {
        info!("   {}", path.as_ref().display());
    }
    info!("💡 最多同时提交 {} 个\n", max_concurrent);
}

/// 打印最终统计信息
pub fn print_final_stats(report: &RunReport, log_file_path: &Path) {
    info!("\n{}", "=".repeat(60));
    info!("📊 全部处理完成统计");
    info!(
        "完成时间: {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    info!("{}", "=".repeat(60));
    for document in &report.documents {
        info!("{}", document);
    }
    info!("{}", "─".repeat(60));
    info!("✅ 成功: {}/{}", report.succeeded(), report.documents.len());
    info!("⏭️ 跳过: {}", report.skipped());
    info!("❌ 失败: {}", report.failures().count());
    if !report.moved.is_empty() || report.purged > 0 {
        info!("📥 移回: {}，🧹 清理: {}", report.moved.len(), report.purged);
    }
    if !report.warnings.is_empty() {
        warn!("⚠️ 警告: {}", report.warnings.len());
        for warning in &report.warnings {
            warn!("   - {}", warning);
        }
    }
    info!("{}", "=".repeat(60));
    info!("\n日志已保存至: {}", log_file_path.display());
}
