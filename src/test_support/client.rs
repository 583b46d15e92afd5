//! 测试用的翻译客户端：按单元预设完成、损坏、挂起或拒绝

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Local;

use crate::clients::{SubmissionHandle, TranslationClient};
use crate::error::SubmissionError;
use crate::models::{Artifact, UnitId, WorkUnit};

#[derive(Debug, Clone)]
pub enum Script {
    /// 延迟后把源文件复制为 `{prefix}{文件名}`
    Complete(Duration),
    /// 延迟后写出一个损坏的文件
    Corrupt(Duration),
    /// 永远不返回
    Hang,
    Reject(String),
}

/// 按单元预设行为的翻译客户端
pub struct ScriptedClient {
    staging: PathBuf,
    prefix: String,
    scripts: HashMap<UnitId, Script>,
    default: Script,
    next_ticket: AtomicU64,
}

impl ScriptedClient {
    pub fn new(staging: impl Into<PathBuf>, default: Script) -> Self {
        Self {
            staging: staging.into(),
            prefix: "al-".to_string(),
            scripts: HashMap::new(),
            default,
            next_ticket: AtomicU64::new(1),
        }
    }

    pub fn with(mut self, unit: UnitId, script: Script) -> Self {
        self.scripts.insert(unit, script);
        self
    }

    fn script(&self, unit: &UnitId) -> Script {
        self.scripts.get(unit).cloned().unwrap_or(self.default.clone())
    }

    fn destination(&self, handle: &SubmissionHandle) -> PathBuf {
        let name = handle
            .source
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        self.staging.join(format!("{}{}", self.prefix, name))
    }
}

#[async_trait]
impl TranslationClient for ScriptedClient {
    async fn submit(&self, unit: &WorkUnit) -> Result<SubmissionHandle, SubmissionError> {
        if let Script::Reject(reason) = self.script(&unit.id()) {
            return Err(SubmissionError::Rejected(reason));
        }
        let ticket = self.next_ticket.fetch_add(1, Ordering::SeqCst);
        Ok(SubmissionHandle::new(unit, ticket))
    }

    async fn await_artifact(&self, handle: &SubmissionHandle) -> Result<Artifact, SubmissionError> {
        let dest = self.destination(handle);
        match self.script(&handle.unit) {
            Script::Complete(delay) => {
                tokio::time::sleep(delay).await;
                std::fs::copy(&handle.source, &dest)
                    .map_err(|e| SubmissionError::Download(e.to_string()))?;
            }
            Script::Corrupt(delay) => {
                tokio::time::sleep(delay).await;
                std::fs::write(&dest, b"truncated download")
                    .map_err(|e| SubmissionError::Download(e.to_string()))?;
            }
            Script::Hang => std::future::pending::<()>().await,
            Script::Reject(reason) => return Err(SubmissionError::Rejected(reason)),
        }
        Ok(Artifact::new(dest, Local::now()))
    }
}
