use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};

use crate::config::Config;

#[derive(Parser, Debug)]
#[command(name = "pdf-translate")]
#[command(about = "拆分大 PDF，通过 readable.jp 翻译后合并")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// TOML 配置文件
    #[arg(long, global = true, env = "PDF_TRANSLATE_CONFIG", value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// 显示详细日志
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// 工作目录（源 PDF 与最终结果）
    #[arg(short = 'w', long, global = true, value_name = "DIR")]
    pub working_dir: Option<PathBuf>,

    /// 暂存目录（译文下载位置）
    #[arg(short = 's', long, global = true, value_name = "DIR")]
    pub staging_dir: Option<PathBuf>,

    /// 每个部分的最大页数
    #[arg(long, global = true)]
    pub max_pages: Option<usize>,

    /// 超过该字节数的文档需要拆分
    #[arg(long, global = true, value_name = "BYTES")]
    pub max_size_bytes: Option<u64>,

    /// 只移动这么多秒以内生成的暂存文件
    #[arg(long, global = true, value_name = "SECS")]
    pub max_age_secs: Option<u64>,

    /// 同时提交的单元数量
    #[arg(short = 'j', long, global = true)]
    pub concurrency: Option<usize>,

    /// 每个单元等待译文的上限
    #[arg(long, global = true, value_name = "SECS")]
    pub unit_timeout_secs: Option<u64>,

    /// 浏览器调试端口（0 表示启动无头浏览器）
    #[arg(long, global = true)]
    pub port: Option<u16>,

    /// 连接前结束正在运行的 Chrome
    #[arg(long, global = true)]
    pub kill_browser: bool,

    /// 运行日志文件
    #[arg(long, global = true, value_name = "FILE")]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// 拆分、提交、合并、整理（默认）
    Run(RunArgs),

    /// 只拆分工作目录中超出阈值的文档
    Split,

    /// 合并目录中的部分文件
    Merge(MergeArgs),

    /// 把最近的暂存文件移回工作目录并清理部分文件
    Reconcile,
}

#[derive(Args, Debug, Default)]
pub struct RunArgs {
    /// 只打印规划，不写部分文件也不启动浏览器
    #[arg(long)]
    pub dry_run: bool,

    /// 以 JSON 写出运行结果
    #[arg(long, value_name = "FILE")]
    pub report_json: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct MergeArgs {
    /// 要扫描的目录（默认暂存目录）
    #[arg(value_name = "DIR")]
    pub dir: Option<PathBuf>,
}

impl Cli {
    /// 命令行参数覆盖配置
    pub fn apply_overrides(&self, config: &mut Config) {
        if self.verbose {
            config.verbose_logging = true;
        }
        if let Some(v) = &self.working_dir {
            config.working_dir = v.clone();
        }
        if let Some(v) = &self.staging_dir {
            config.staging_dir = v.clone();
        }
        if let Some(v) = self.max_pages {
            config.max_pages = v;
        }
        if let Some(v) = self.max_size_bytes {
            config.max_size_bytes = v;
        }
        if let Some(v) = self.max_age_secs {
            config.max_age = Duration::from_secs(v);
        }
        if let Some(v) = self.concurrency {
            config.max_concurrent_units = v;
        }
        if let Some(v) = self.unit_timeout_secs {
            config.unit_timeout = Duration::from_secs(v);
        }
        if let Some(v) = self.port {
            config.browser_debug_port = v;
        }
        if self.kill_browser {
            config.kill_browser_first = true;
        }
        if let Some(v) = &self.log_file {
            config.output_log_file = v.clone();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_override_config() {
        let cli = Cli::parse_from([
            "pdf-translate",
            "run",
            "--dry-run",
            "-w",
            "/data/in",
            "--max-pages",
            "50",
            "-j",
            "2",
            "--port",
            "0",
        ]);
        let mut config = Config::default();
        cli.apply_overrides(&mut config);

        assert_eq!(config.working_dir, PathBuf::from("/data/in"));
        assert_eq!(config.max_pages, 50);
        assert_eq!(config.max_concurrent_units, 2);
        assert_eq!(config.browser_debug_port, 0);
        assert!(matches!(
            cli.command,
            Some(Commands::Run(RunArgs { dry_run: true, .. }))
        ));
    }

    #[test]
    fn test_subcommand_is_optional() {
        let cli = Cli::parse_from(["pdf-translate"]);
        assert!(cli.command.is_none());

        let cli = Cli::parse_from(["pdf-translate", "merge", "/tmp/x"]);
        assert!(matches!(
            cli.command,
            Some(Commands::Merge(MergeArgs { dir: Some(_) }))
        ));
    }

    #[test]
    fn test_cli_definition_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
