//! 运行结果汇总
//!
//! 每个源文档一条记录，决定退出码；可序列化为 JSON 供脚本使用。

use std::path::PathBuf;

use chrono::{DateTime, Local};
use serde::Serialize;

use crate::services::ReconcileReport;

/// 单个文档的处理结果
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum DocumentOutcome {
    /// 未提交
    Skipped { reason: String },
    /// 只做了规划（`--dry-run` 或 `split`）
    Planned { units: usize },
    /// 未拆分，译文已取回
    Translated { output: Option<PathBuf> },
    /// 拆分后各部分译文已合并
    Merged { output: PathBuf, parts: usize },
    Failed { reason: String },
}

impl DocumentOutcome {
    pub fn is_failure(&self) -> bool {
        matches!(self, DocumentOutcome::Failed { .. })
    }

    fn label(&self) -> &'static str {
        match self {
            DocumentOutcome::Skipped { .. } => "跳过",
            DocumentOutcome::Planned { .. } => "已规划",
            DocumentOutcome::Translated { .. } => "已翻译",
            DocumentOutcome::Merged { .. } => "已合并",
            DocumentOutcome::Failed { .. } => "失败",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DocumentReport {
    /// 源文件名
    pub file: String,
    #[serde(flatten)]
    pub outcome: DocumentOutcome,
}

impl std::fmt::Display for DocumentReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.outcome.label(), self.file)?;
        match &self.outcome {
            DocumentOutcome::Skipped { reason } | DocumentOutcome::Failed { reason } => {
                write!(f, ": {}", reason)
            }
            DocumentOutcome::Planned { units } => write!(f, ": {} 个单元", units),
            DocumentOutcome::Translated { output: Some(path) } => {
                write!(f, " → {}", path.display())
            }
            DocumentOutcome::Translated { output: None } => Ok(()),
            DocumentOutcome::Merged { output, parts } => {
                write!(f, " → {} ({} 个部分)", output.display(), parts)
            }
        }
    }
}

/// 一次运行的汇总
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub started_at: DateTime<Local>,
    pub finished_at: Option<DateTime<Local>>,
    pub documents: Vec<DocumentReport>,
    /// 整理阶段移动到工作目录的文件名
    pub moved: Vec<String>,
    /// 清理掉的部分文件数量
    pub purged: usize,
    pub warnings: Vec<String>,
}

impl Default for RunReport {
    fn default() -> Self {
        Self::new()
    }
}

impl RunReport {
    pub fn new() -> Self {
        Self {
            started_at: Local::now(),
            finished_at: None,
            documents: Vec::new(),
            moved: Vec::new(),
            purged: 0,
            warnings: Vec::new(),
        }
    }

    pub fn push(&mut self, file: impl Into<String>, outcome: DocumentOutcome) {
        self.documents.push(DocumentReport {
            file: file.into(),
            outcome,
        });
    }

    pub fn finish(&mut self) {
        self.finished_at = Some(Local::now());
    }

    pub fn outcome(&self, file: &str) -> Option<&DocumentOutcome> {
        self.documents
            .iter()
            .find(|d| d.file == file)
            .map(|d| &d.outcome)
    }

    pub fn failures(&self) -> impl Iterator<Item = &DocumentReport> {
        self.documents.iter().filter(|d| d.outcome.is_failure())
    }

    pub fn succeeded(&self) -> usize {
        self.documents
            .iter()
            .filter(|d| {
                matches!(
                    d.outcome,
                    DocumentOutcome::Translated { .. } | DocumentOutcome::Merged { .. }
                )
            })
            .count()
    }

    pub fn skipped(&self) -> usize {
        self.documents
            .iter()
            .filter(|d| matches!(d.outcome, DocumentOutcome::Skipped { .. }))
            .count()
    }

    /// 有任何文档失败时为 1
    pub fn exit_code(&self) -> i32 {
        if self.failures().next().is_some() {
            1
        } else {
            0
        }
    }

    /// 记录整理阶段的结果，警告保留原文
    pub fn record_reconcile(&mut self, reconciled: &ReconcileReport) {
        self.moved = reconciled.moved_names();
        self.purged = reconciled.purged.len();
        self.warnings
            .extend(reconciled.warnings.iter().map(ToString::to_string));
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}
