//! 翻译服务抽象
//!
//! 核心流程只依赖"提交文件、等待译文"两个能力，浏览器驱动的实现见 `browser::ReadableClient`。

use std::path::PathBuf;

use async_trait::async_trait;
use serde::Serialize;

use crate::error::SubmissionError;
use crate::models::{Artifact, UnitId, WorkUnit};

/// 一次提交的凭据
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubmissionHandle {
    pub unit: UnitId,
    /// 提交的源文件
    pub source: PathBuf,
    /// 客户端内部编号
    pub ticket: u64,
}

impl SubmissionHandle {
    pub fn new(unit: &WorkUnit, ticket: u64) -> Self {
        Self {
            unit: unit.id(),
            source: unit.path().to_path_buf(),
            ticket,
        }
    }
}

/// 翻译服务客户端
///
/// 实现方负责把译文放到暂存目录；等待上限由调用方（`JobTracker`）控制，
/// `await_artifact` 的 future 被丢弃时不应留下半成品文件。
#[async_trait]
pub trait TranslationClient: Send + Sync {
    /// 提交一个单元
    async fn submit(&self, unit: &WorkUnit) -> Result<SubmissionHandle, SubmissionError>;

    /// 等待译文就绪并返回下载后的文件
    async fn await_artifact(&self, handle: &SubmissionHandle) -> Result<Artifact, SubmissionError>;
}
