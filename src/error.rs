//! 错误类型
//!
//! 按处理阶段划分：拆分、提交、合并、整理、配置。
//! 单个文档或单个分组的失败只影响自身，顶层 `AppError` 只用于整个运行无法继续的情况。

use std::path::PathBuf;

use thiserror::Error;

/// 应用程序错误类型
#[derive(Debug, Error)]
pub enum AppError {
    /// 配置错误
    #[error("配置错误: {0}")]
    Config(#[from] ConfigError),
    /// 浏览器相关错误
    #[error("浏览器错误: {0}")]
    Browser(#[from] BrowserError),
    /// 拆分错误
    #[error("拆分错误: {0}")]
    Split(#[from] SplitError),
    /// 合并错误
    #[error("合并错误: {0}")]
    Merge(#[from] MergeError),
    /// 文件操作错误
    #[error("文件错误 ({path}): {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// 无法扫描目录
    #[error("扫描目录失败: {0:#}")]
    Scan(anyhow::Error),
    /// 后台任务异常退出
    #[error("后台任务失败: {0}")]
    Task(#[from] tokio::task::JoinError),
}

impl AppError {
    /// 创建带路径的文件错误
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        AppError::Io {
            path: path.into(),
            source,
        }
    }
}

/// PDF 读写错误
#[derive(Debug, Error)]
pub enum PdfError {
    /// 无法解析 PDF 文件
    #[error("无法读取 PDF ({path}): {source}")]
    Load {
        path: PathBuf,
        #[source]
        source: lopdf::Error,
    },
    /// PDF 结构不完整（缺少页面树等）
    #[error("PDF 结构异常 ({path}): {reason}")]
    Structure { path: PathBuf, reason: String },
    /// 序列化失败
    #[error("写入 PDF 失败 ({path}): {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// 拆分错误：只对当前文档致命
#[derive(Debug, Error)]
pub enum SplitError {
    /// 源文件无法读取或已损坏
    #[error("源文件不可读: {0}")]
    Unreadable(#[from] PdfError),
    /// 源文件元数据读取失败
    #[error("无法读取文件信息 ({path}): {source}")]
    Metadata {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// 无法从文件名得到文档标识
    #[error("无法识别的文件名: {path}")]
    InvalidName { path: PathBuf },
    /// 文档没有任何页面
    #[error("文档没有页面: {path}")]
    Empty { path: PathBuf },
    /// 分页阈值非法
    #[error("每部分最大页数必须大于 0")]
    ZeroPageLimit,
}

/// 提交错误：只影响对应的单元，分组层面可恢复
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SubmissionError {
    /// 等待译文超时
    #[error("等待译文超时 ({seconds} 秒)")]
    Timeout { seconds: u64 },
    /// 翻译服务拒绝了提交
    #[error("提交被拒绝: {0}")]
    Rejected(String),
    /// 浏览器会话出错
    #[error("浏览器会话出错: {0}")]
    Session(String),
    /// 下载译文失败
    #[error("下载译文失败: {0}")]
    Download(String),
}

/// 合并错误：只对当前分组致命
#[derive(Debug, Error)]
pub enum MergeError {
    /// 分组中的某个部分无法读取
    #[error("部分文件不可读: {0}")]
    UnreadablePart(#[from] PdfError),
    /// 两个文件解析出相同的序号，无法确定页序
    #[error("分组 {base} 中序号 {index} 重复: {first} / {second}")]
    DuplicateIndex {
        base: String,
        index: u32,
        first: PathBuf,
        second: PathBuf,
    },
    /// 分组中没有任何文件
    #[error("分组 {base} 没有可合并的文件")]
    EmptyGroup { base: String },
    /// 合并结果无法落盘
    #[error("无法保存合并结果 ({path}): {source}")]
    Persist {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// 整理过程中的警告：记录后继续
#[derive(Debug, Error)]
pub enum ReconcileWarning {
    /// 文件在处理前已经不存在（可能已被移动）
    #[error("文件已不存在: {path}")]
    Missing { path: PathBuf },
    /// 目标位置已有同名文件
    #[error("目标文件已存在，保留在暂存目录: {path}")]
    DestinationExists { path: PathBuf },
    /// 其他文件操作失败（权限等）
    #[error("文件操作失败 ({path}): {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ReconcileWarning {
    /// 根据 io 错误类型区分"已不存在"与其他失败
    pub fn from_io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        let path = path.into();
        if source.kind() == std::io::ErrorKind::NotFound {
            ReconcileWarning::Missing { path }
        } else {
            ReconcileWarning::Io { path, source }
        }
    }
}

/// 浏览器相关错误
#[derive(Debug, Error)]
pub enum BrowserError {
    /// 连接浏览器失败
    #[error("无法连接到浏览器 (端口: {port}): {source}")]
    ConnectionFailed {
        port: u16,
        #[source]
        source: chromiumoxide::error::CdpError,
    },
    /// 浏览器配置失败
    #[error("浏览器配置失败: {0}")]
    ConfigurationFailed(String),
    /// 浏览器启动失败
    #[error("浏览器启动失败: {0}")]
    LaunchFailed(#[source] chromiumoxide::error::CdpError),
    /// 页面操作失败
    #[error("页面操作失败: {0}")]
    Cdp(#[from] chromiumoxide::error::CdpError),
    /// 脚本返回值无法解析
    #[error("脚本返回值解析失败: {0}")]
    Script(#[from] serde_json::Error),
    /// 等待页面元素超时
    #[error("等待元素 {selector} 超时 ({seconds} 秒)")]
    ElementTimeout { selector: String, seconds: u64 },
}

impl From<BrowserError> for SubmissionError {
    fn from(e: BrowserError) -> Self {
        SubmissionError::Session(e.to_string())
    }
}

/// 配置错误
#[derive(Debug, Error)]
pub enum ConfigError {
    /// 环境变量解析失败
    #[error("环境变量 {var_name} 解析失败: 值 '{value}' 无法转换为 {expected_type}")]
    EnvVarParseFailed {
        var_name: String,
        value: String,
        expected_type: String,
    },
    /// 配置文件读取失败
    #[error("无法读取配置文件 ({path}): {source}")]
    FileReadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// 配置文件解析失败
    #[error("配置文件解析失败 ({path}): {source}")]
    TomlParseFailed {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    /// 配置值非法
    #[error("配置项 {field} 非法: {reason}")]
    Invalid { field: &'static str, reason: String },
    /// 无法确定目录
    #[error("无法确定 {0}")]
    MissingDirectory(&'static str),
}

/// 应用程序结果类型
pub type AppResult<T> = Result<T, AppError>;
