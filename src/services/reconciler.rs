//! 结果整理 - 业务能力层
//!
//! 把暂存目录中最近生成的 PDF 移回工作目录，再清理工作目录中残留的部分文件。
//! 单个文件失败只记录警告，不中断整理。

use std::fs::File;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::error::ReconcileWarning;
use crate::models::loaders::is_pdf;
use crate::models::PartName;

/// 整理结果
#[derive(Debug, Default)]
pub struct ReconcileReport {
    /// (原位置, 新位置)
    pub moved: Vec<(PathBuf, PathBuf)>,
    /// 已删除的部分文件
    pub purged: Vec<PathBuf>,
    pub warnings: Vec<ReconcileWarning>,
}

impl ReconcileReport {
    fn warn(&mut self, warning: ReconcileWarning) {
        warn!("⚠️ {}", warning);
        self.warnings.push(warning);
    }

    pub fn moved_names(&self) -> Vec<String> {
        self.moved
            .iter()
            .filter_map(|(_, to)| to.file_name())
            .map(|n| n.to_string_lossy().into_owned())
            .collect()
    }
}

/// 整理参数
#[derive(Debug, Clone, Serialize)]
pub struct Reconciler {
    staging_dir: PathBuf,
    working_dir: PathBuf,
    max_age: Duration,
}

impl Reconciler {
    pub fn new(
        staging_dir: impl Into<PathBuf>,
        working_dir: impl Into<PathBuf>,
        max_age: Duration,
    ) -> Self {
        Self {
            staging_dir: staging_dir.into(),
            working_dir: working_dir.into(),
            max_age,
        }
    }

    /// 移动 + 清理
    pub fn reconcile(&self) -> ReconcileReport {
        let mut report = ReconcileReport::default();
        self.move_recent(SystemTime::now(), &mut report);
        self.purge_parts(&mut report);

        info!(
            "📦 整理完成: 移动 {} 个文件，清理 {} 个部分文件，{} 条警告",
            report.moved.len(),
            report.purged.len(),
            report.warnings.len()
        );
        report
    }

    fn move_recent(&self, now: SystemTime, report: &mut ReconcileReport) {
        let entries = match std::fs::read_dir(&self.staging_dir) {
            Ok(entries) => entries,
            Err(e) => {
                report.warn(ReconcileWarning::from_io(&self.staging_dir, e));
                return;
            }
        };

        let mut candidates: Vec<PathBuf> = entries
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| path.is_file() && is_pdf(path))
            .collect();
        candidates.sort();

        for path in candidates {
            let modified = match std::fs::metadata(&path).and_then(|m| m.modified()) {
                Ok(modified) => modified,
                Err(e) => {
                    report.warn(ReconcileWarning::from_io(&path, e));
                    continue;
                }
            };
            // 时钟回拨时 duration_since 失败，视为刚生成
            let age = now.duration_since(modified).unwrap_or_default();
            if age > self.max_age {
                debug!("跳过较早的文件: {}", path.display());
                continue;
            }

            let Some(file_name) = path.file_name() else {
                continue;
            };
            let destination = self.working_dir.join(file_name);
            match move_without_overwrite(&path, &destination) {
                Ok(()) => {
                    info!("📥 已移动: {} → {}", path.display(), destination.display());
                    report.moved.push((path, destination));
                }
                Err(warning) => report.warn(warning),
            }
        }
    }

    fn purge_parts(&self, report: &mut ReconcileReport) {
        let entries = match std::fs::read_dir(&self.working_dir) {
            Ok(entries) => entries,
            Err(e) => {
                report.warn(ReconcileWarning::from_io(&self.working_dir, e));
                return;
            }
        };

        let mut parts: Vec<PathBuf> = entries
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| path.is_file() && PartName::from_path(path).is_some())
            .collect();
        parts.sort();

        for path in parts {
            match std::fs::remove_file(&path) {
                Ok(()) => {
                    debug!("🧹 已删除部分文件: {}", path.display());
                    report.purged.push(path);
                }
                Err(e) => report.warn(ReconcileWarning::from_io(&path, e)),
            }
        }
    }
}

/// 移动文件，目标已存在时不覆盖；只有跨文件系统时才退回到复制 + 删除
fn move_without_overwrite(from: &Path, to: &Path) -> Result<(), ReconcileWarning> {
    if to.exists() {
        return Err(ReconcileWarning::DestinationExists {
            path: to.to_path_buf(),
        });
    }

    match std::fs::rename(from, to) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == ErrorKind::CrossesDevices => {
            copy_then_remove(from, to, |path| std::fs::remove_file(path))
        }
        Err(e) => Err(ReconcileWarning::from_io(from, e)),
    }
}

/// 先复制到目标目录中的临时文件，再不覆盖地改名，最后删除源文件。
///
/// 任何一步失败，目标位置都不会留下文件，源文件保持原样。
fn copy_then_remove<F>(from: &Path, to: &Path, remove_source: F) -> Result<(), ReconcileWarning>
where
    F: FnOnce(&Path) -> std::io::Result<()>,
{
    let dir = to.parent().unwrap_or_else(|| Path::new("."));
    let mut tmp = tempfile::Builder::new()
        .prefix(".pdf-translate-")
        .suffix(".moving")
        .tempfile_in(dir)
        .map_err(|e| ReconcileWarning::from_io(dir, e))?;

    let mut source = File::open(from).map_err(|e| ReconcileWarning::from_io(from, e))?;
    std::io::copy(&mut source, tmp.as_file_mut())
        .map_err(|e| ReconcileWarning::from_io(from, e))?;

    tmp.persist_noclobber(to).map_err(|e| {
        if e.error.kind() == ErrorKind::AlreadyExists {
            ReconcileWarning::DestinationExists {
                path: to.to_path_buf(),
            }
        } else {
            ReconcileWarning::from_io(to, e.error)
        }
    })?;

    if let Err(e) = remove_source(from) {
        if let Err(cleanup) = std::fs::remove_file(to) {
            warn!("⚠️ 无法撤销复制 {}: {}", to.display(), cleanup);
        }
        return Err(ReconcileWarning::from_io(from, e));
    }
    Ok(())
}

/// 用给定参数执行一次整理
pub fn reconcile(staging_dir: &Path, working_dir: &Path, max_age: Duration) -> ReconcileReport {
    Reconciler::new(staging_dir, working_dir, max_age).reconcile()
}
