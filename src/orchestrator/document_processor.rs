//! 单个文档的规划 - 编排层
//!
//! 对工作目录中的每个 PDF 决定：跳过、原样提交、拆分后提交，或记为失败。
//! 同步执行，由 `batch_processor` 放到 `spawn_blocking` 中调用。

use std::ops::Range;
use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::models::{DirectoryListing, Document, PartName, WorkUnit};
use crate::services::{page_windows, Partitioner, SkipSet};

/// 单个文档的规划结果
#[derive(Debug, Clone)]
pub enum PlannedDocument {
    Skip {
        file: String,
        reason: String,
    },
    /// 已生成提交单元（拆分出的部分已写盘）
    Submit {
        file: String,
        document: Document,
        units: Vec<WorkUnit>,
    },
    /// 只预览页码范围，不写任何文件
    Preview {
        file: String,
        document: Document,
        windows: Vec<Range<usize>>,
    },
    Failed {
        file: String,
        reason: String,
    },
}

impl PlannedDocument {
    pub fn file(&self) -> &str {
        match self {
            PlannedDocument::Skip { file, .. }
            | PlannedDocument::Submit { file, .. }
            | PlannedDocument::Preview { file, .. }
            | PlannedDocument::Failed { file, .. } => file,
        }
    }
}

/// 整个工作目录的规划
#[derive(Debug, Clone, Default)]
pub struct WorkPlan {
    pub documents: Vec<PlannedDocument>,
}

impl WorkPlan {
    /// 按文档顺序排列的全部提交单元
    pub fn units(&self) -> Vec<WorkUnit> {
        self.documents
            .iter()
            .filter_map(|d| match d {
                PlannedDocument::Submit { units, .. } => Some(units.iter().cloned()),
                _ => None,
            })
            .flatten()
            .collect()
    }

    pub fn unit_paths(&self) -> Vec<PathBuf> {
        self.units().iter().map(|u| u.path().to_path_buf()).collect()
    }
}

/// 文档规划器
#[derive(Debug, Clone)]
pub struct DocumentPlanner {
    skip_set: SkipSet,
    partitioner: Partitioner,
    /// false 时只计算页码范围，不写部分文件
    materialize: bool,
}

impl DocumentPlanner {
    pub fn new(skip_set: SkipSet, partitioner: Partitioner) -> Self {
        Self {
            skip_set,
            partitioner,
            materialize: true,
        }
    }

    pub fn preview_only(mut self) -> Self {
        self.materialize = false;
        self
    }

    pub fn plan(&self, listing: &DirectoryListing) -> WorkPlan {
        WorkPlan {
            documents: listing
                .pdf_files
                .iter()
                .map(|path| self.plan_document(path, listing))
                .collect(),
        }
    }

    pub fn plan_document(&self, path: &Path, listing: &DirectoryListing) -> PlannedDocument {
        let file = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        if let Some(original) = self.skip_set.original_for(&file, listing) {
            info!("⏭️ {} 已有同名原文件 {}，跳过", file, original);
            return PlannedDocument::Skip {
                reason: format!("原文件 {} 已存在", original),
                file,
            };
        }

        if PartName::parse(&file).is_some() {
            info!("⏭️ {} 是残留的部分文件，跳过", file);
            return PlannedDocument::Skip {
                file,
                reason: "残留的部分文件".to_string(),
            };
        }

        let document = match Document::inspect(path) {
            Ok(document) => document,
            Err(e) => {
                warn!("❌ {}: {}", file, e);
                return PlannedDocument::Failed {
                    file,
                    reason: e.to_string(),
                };
            }
        };

        if !self.materialize {
            let limits = self.partitioner.limits();
            let windows = if limits.fits(&document) {
                vec![0..document.page_count]
            } else {
                page_windows(document.page_count, limits.max_pages)
            };
            return PlannedDocument::Preview {
                file,
                document,
                windows,
            };
        }

        match self.partitioner.partition(&document) {
            Ok(units) => PlannedDocument::Submit {
                file,
                document,
                units,
            },
            Err(e) => {
                warn!("❌ {} 拆分失败: {}", file, e);
                PlannedDocument::Failed {
                    file,
                    reason: e.to_string(),
                }
            }
        }
    }
}
