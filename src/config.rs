//! 程序配置
//!
//! 优先级（低 → 高）：默认值 → TOML 配置文件 → 环境变量 → 命令行参数。
//! 命令行覆盖在 `cli` 模块中完成。

use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use serde::Deserialize;

use crate::error::ConfigError;
use crate::services::partitioner::SplitLimits;

/// 单个文件允许的最大字节数默认值（50 MiB）
pub const DEFAULT_MAX_SIZE_BYTES: u64 = 50 * 1024 * 1024;

/// 程序配置
#[derive(Clone, Debug)]
pub struct Config {
    /// 每个部分的最大页数
    pub max_pages: usize,
    /// 超过该字节数的文档需要拆分
    pub max_size_bytes: u64,
    /// 整理阶段只搬运这么久以内生成的文件
    pub max_age: Duration,
    /// 工作目录（源 PDF 与最终结果所在位置）
    pub working_dir: PathBuf,
    /// 暂存目录（译文下载位置）
    pub staging_dir: PathBuf,
    /// 译文文件名前缀，带此前缀且去掉后已存在同名文件的文档会被跳过
    pub reprocessed_prefix: String,
    /// 同时提交的单元数量
    pub max_concurrent_units: usize,
    /// 每个单元等待译文的上限
    pub unit_timeout: Duration,
    /// 全部下载结束后、合并前的等待时间
    pub settle_delay: Duration,
    /// 浏览器调试端口，0 表示启动无头浏览器
    pub browser_debug_port: u16,
    /// 翻译服务上传页面
    pub target_url: String,
    /// 启动前是否结束正在运行的 Chrome
    pub kill_browser_first: bool,
    /// 是否显示详细日志
    pub verbose_logging: bool,
    /// 运行日志文件
    pub output_log_file: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_pages: 100,
            max_size_bytes: DEFAULT_MAX_SIZE_BYTES,
            max_age: Duration::from_secs(5 * 60 * 60),
            working_dir: PathBuf::from("."),
            staging_dir: default_staging_dir(),
            reprocessed_prefix: "al-".to_string(),
            max_concurrent_units: 8,
            unit_timeout: Duration::from_secs(300),
            settle_delay: Duration::from_secs(5),
            browser_debug_port: 9222,
            target_url: "https://readable.jp/translate".to_string(),
            kill_browser_first: false,
            verbose_logging: false,
            output_log_file: PathBuf::from("translate_log.txt"),
        }
    }
}

/// 平台默认下载目录
fn default_staging_dir() -> PathBuf {
    dirs::download_dir()
        .or_else(|| dirs::home_dir().map(|home| home.join("Downloads")))
        .unwrap_or_else(|| PathBuf::from("Downloads"))
}

/// TOML 配置文件内容，所有字段可选
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    pub max_pages: Option<usize>,
    pub max_size_bytes: Option<u64>,
    pub max_age_secs: Option<u64>,
    pub working_dir: Option<PathBuf>,
    pub staging_dir: Option<PathBuf>,
    pub reprocessed_prefix: Option<String>,
    pub max_concurrent_units: Option<usize>,
    pub unit_timeout_secs: Option<u64>,
    pub settle_delay_secs: Option<u64>,
    pub browser_debug_port: Option<u16>,
    pub target_url: Option<String>,
    pub kill_browser_first: Option<bool>,
    pub verbose_logging: Option<bool>,
    pub output_log_file: Option<PathBuf>,
}

impl ConfigFile {
    /// 读取并解析配置文件
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content =
            std::fs::read_to_string(path).map_err(|source| ConfigError::FileReadFailed {
                path: path.to_path_buf(),
                source,
            })?;
        Self::parse(&content).map_err(|source| ConfigError::TomlParseFailed {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn parse(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }
}

impl Config {
    /// 按 默认值 → 配置文件 → 环境变量 的顺序构建配置
    pub fn load(config_file: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        if let Some(path) = config_file {
            config.apply_file(ConfigFile::load(path)?);
        }
        config.apply_env()?;
        Ok(config)
    }

    /// 只使用默认值和环境变量
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();
        config.apply_env()?;
        Ok(config)
    }

    /// 用配置文件中出现的字段覆盖当前值
    pub fn apply_file(&mut self, file: ConfigFile) {
        if let Some(v) = file.max_pages {
            self.max_pages = v;
        }
        if let Some(v) = file.max_size_bytes {
            self.max_size_bytes = v;
        }
        if let Some(v) = file.max_age_secs {
            self.max_age = Duration::from_secs(v);
        }
        if let Some(v) = file.working_dir {
            self.working_dir = v;
        }
        if let Some(v) = file.staging_dir {
            self.staging_dir = v;
        }
        if let Some(v) = file.reprocessed_prefix {
            self.reprocessed_prefix = v;
        }
        if let Some(v) = file.max_concurrent_units {
            self.max_concurrent_units = v;
        }
        if let Some(v) = file.unit_timeout_secs {
            self.unit_timeout = Duration::from_secs(v);
        }
        if let Some(v) = file.settle_delay_secs {
            self.settle_delay = Duration::from_secs(v);
        }
        if let Some(v) = file.browser_debug_port {
            self.browser_debug_port = v;
        }
        if let Some(v) = file.target_url {
            self.target_url = v;
        }
        if let Some(v) = file.kill_browser_first {
            self.kill_browser_first = v;
        }
        if let Some(v) = file.verbose_logging {
            self.verbose_logging = v;
        }
        if let Some(v) = file.output_log_file {
            self.output_log_file = v;
        }
    }

    /// 用环境变量覆盖当前值
    pub fn apply_env(&mut self) -> Result<(), ConfigError> {
        if let Some(v) = env_parse("MAX_PAGES", "usize")? {
            self.max_pages = v;
        }
        if let Some(v) = env_parse("MAX_SIZE_BYTES", "u64")? {
            self.max_size_bytes = v;
        }
        if let Some(v) = env_parse("MAX_AGE_SECS", "u64")? {
            self.max_age = Duration::from_secs(v);
        }
        if let Some(v) = env_string("WORKING_DIR") {
            self.working_dir = PathBuf::from(v);
        }
        if let Some(v) = env_string("STAGING_DIR") {
            self.staging_dir = PathBuf::from(v);
        }
        if let Some(v) = env_string("REPROCESSED_PREFIX") {
            self.reprocessed_prefix = v;
        }
        if let Some(v) = env_parse("MAX_CONCURRENT_UNITS", "usize")? {
            self.max_concurrent_units = v;
        }
        if let Some(v) = env_parse("UNIT_TIMEOUT_SECS", "u64")? {
            self.unit_timeout = Duration::from_secs(v);
        }
        if let Some(v) = env_parse("SETTLE_DELAY_SECS", "u64")? {
            self.settle_delay = Duration::from_secs(v);
        }
        if let Some(v) = env_parse("BROWSER_DEBUG_PORT", "u16")? {
            self.browser_debug_port = v;
        }
        if let Some(v) = env_string("TARGET_URL") {
            self.target_url = v;
        }
        if let Some(v) = env_parse("KILL_BROWSER_FIRST", "bool")? {
            self.kill_browser_first = v;
        }
        if let Some(v) = env_parse("VERBOSE_LOGGING", "bool")? {
            self.verbose_logging = v;
        }
        if let Some(v) = env_string("OUTPUT_LOG_FILE") {
            self.output_log_file = PathBuf::from(v);
        }
        Ok(())
    }

    /// 检查配置值是否可用
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_pages == 0 {
            return Err(ConfigError::Invalid {
                field: "max_pages",
                reason: "必须大于 0".to_string(),
            });
        }
        if self.max_concurrent_units == 0 {
            return Err(ConfigError::Invalid {
                field: "max_concurrent_units",
                reason: "必须大于 0".to_string(),
            });
        }
        if self.unit_timeout.is_zero() {
            return Err(ConfigError::Invalid {
                field: "unit_timeout",
                reason: "必须大于 0 秒".to_string(),
            });
        }
        if self.working_dir.as_os_str().is_empty() {
            return Err(ConfigError::MissingDirectory("工作目录"));
        }
        if self.staging_dir.as_os_str().is_empty() {
            return Err(ConfigError::MissingDirectory("暂存目录"));
        }
        Ok(())
    }

    /// 拆分阈值
    pub fn split_limits(&self) -> SplitLimits {
        SplitLimits {
            max_pages: self.max_pages,
            max_size_bytes: self.max_size_bytes,
        }
    }
}

fn env_string(var_name: &str) -> Option<String> {
    std::env::var(var_name).ok().filter(|v| !v.is_empty())
}

fn env_parse<T: FromStr>(var_name: &str, expected_type: &str) -> Result<Option<T>, ConfigError> {
    match env_string(var_name) {
        None => Ok(None),
        Some(value) => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::EnvVarParseFailed {
                var_name: var_name.to_string(),
                value,
                expected_type: expected_type.to_string(),
            }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_documented_values() {
        let config = Config::default();
        assert_eq!(config.max_pages, 100);
        assert_eq!(config.max_size_bytes, 50 * 1024 * 1024);
        assert_eq!(config.max_age, Duration::from_secs(5 * 3600));
        assert_eq!(config.reprocessed_prefix, "al-");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_file_overrides_only_present_fields() {
        let file = ConfigFile::parse(
            r#"
            max_pages = 40
            max_age_secs = 60
            staging_dir = "/tmp/staging"
            "#,
        )
        .unwrap();

        let mut config = Config::default();
        config.apply_file(file);

        assert_eq!(config.max_pages, 40);
        assert_eq!(config.max_age, Duration::from_secs(60));
        assert_eq!(config.staging_dir, PathBuf::from("/tmp/staging"));
        // 未出现的字段保持默认
        assert_eq!(config.max_size_bytes, DEFAULT_MAX_SIZE_BYTES);
    }

    #[test]
    fn test_unknown_field_is_rejected() {
        assert!(ConfigFile::parse("max_pagez = 3").is_err());
    }

    #[test]
    fn test_validate_rejects_zero_limits() {
        let config = Config {
            max_pages: 0,
            ..Config::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Invalid {
                field: "max_pages",
                ..
            })
        ));

        let config = Config {
            unit_timeout: Duration::ZERO,
            ..Config::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_missing_config_file_reports_path() {
        let err = ConfigFile::load(Path::new("/definitely/not/here.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::FileReadFailed { .. }));
    }
}
