//! 部分合并 - 业务能力层
//!
//! 扫描目录中带部分标记的 PDF，按基础名分组、按序号排序后拼接为 `{base}.pdf`，
//! 成功落盘后再删除该组的源文件。
//!
//! - 目录列表只取一次快照，扫描之后新出现的文件不参与本轮合并
//! - 某一组失败（文件损坏或序号重复）不影响其他组，也不会留下半成品
//! - 只删除本组已经成功并入结果的文件

use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::error::{MergeError, PdfError};
use crate::infrastructure::{save_atomic, PdfFile};
use crate::models::loaders::is_pdf;
use crate::models::part::{has_part_marker, PartName};

/// 扫描到的一个部分文件
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArtifactEntry {
    pub name: PartName,
    pub path: PathBuf,
}

/// 同一基础名下的部分文件，保持扫描顺序
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArtifactGroup {
    pub base: String,
    pub members: Vec<ArtifactEntry>,
}

impl ArtifactGroup {
    pub fn new(base: impl Into<String>) -> Self {
        Self {
            base: base.into(),
            members: Vec::new(),
        }
    }

    /// 合并结果文件名
    pub fn output_file_name(&self) -> String {
        format!("{}.pdf", self.base)
    }

    /// 按序号排序；序号重复时拒绝，不连续只记录警告
    pub fn ordered(&self) -> Result<Vec<&ArtifactEntry>, MergeError> {
        if self.members.is_empty() {
            return Err(MergeError::EmptyGroup {
                base: self.base.clone(),
            });
        }

        let mut ordered: Vec<&ArtifactEntry> = self.members.iter().collect();
        ordered.sort_by_key(|entry| entry.name.index);

        for pair in ordered.windows(2) {
            if pair[0].name.index == pair[1].name.index {
                return Err(MergeError::DuplicateIndex {
                    base: self.base.clone(),
                    index: pair[0].name.index,
                    first: pair[0].path.clone(),
                    second: pair[1].path.clone(),
                });
            }
        }

        if ordered
            .iter()
            .enumerate()
            .any(|(position, entry)| entry.name.index != position as u32 + 1)
        {
            let indices: Vec<u32> = ordered.iter().map(|e| e.name.index).collect();
            warn!("⚠️ 分组 {} 的序号不连续: {:?}", self.base, indices);
        }

        Ok(ordered)
    }
}

/// 目录扫描结果
#[derive(Debug, Clone, Default, Serialize)]
pub struct ArtifactScan {
    /// 按基础名排序的分组
    pub groups: Vec<ArtifactGroup>,
    /// 带部分标记但无法解析序号的文件
    pub unparsed: Vec<PathBuf>,
}

/// 对目录做一次快照并分组
pub fn scan_artifacts(dir: &Path) -> std::io::Result<ArtifactScan> {
    let mut paths: Vec<PathBuf> = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        if entry.file_type().map(|t| t.is_file()).unwrap_or(false) {
            paths.push(entry.path());
        }
    }

    let mut groups: BTreeMap<String, ArtifactGroup> = BTreeMap::new();
    let mut unparsed = Vec::new();

    for path in paths {
        let Some(file_name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        if !is_pdf(&path) || !has_part_marker(file_name) {
            continue;
        }
        match PartName::parse(file_name) {
            Some(name) => groups
                .entry(name.base.clone())
                .or_insert_with(|| ArtifactGroup::new(name.base.clone()))
                .members
                .push(ArtifactEntry { name, path }),
            None => {
                warn!("⚠️ 无法识别部分序号，忽略: {}", path.display());
                unparsed.push(path);
            }
        }
    }

    Ok(ArtifactScan {
        groups: groups.into_values().collect(),
        unparsed,
    })
}

/// 合并结果
#[derive(Debug, Default)]
pub struct ReassemblyReport {
    /// 基础名 → 合并后的文件
    pub merged: BTreeMap<String, PathBuf>,
    /// 基础名 → 失败原因
    pub failed: BTreeMap<String, MergeError>,
    /// 因对应文档不完整而暂不合并的基础名
    pub held: Vec<String>,
    /// 无法识别序号的文件
    pub unparsed: Vec<PathBuf>,
}

impl ReassemblyReport {
    pub fn has_failures(&self) -> bool {
        !self.failed.is_empty()
    }
}

/// 合并器
#[derive(Debug, Clone, Default)]
pub struct Reassembler {
    held: HashSet<String>,
}

impl Reassembler {
    pub fn new() -> Self {
        Self::default()
    }

    /// 指定暂不合并的基础名（对应文档有部分未完成）
    pub fn holding<I, S>(bases: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            held: bases.into_iter().map(Into::into).collect(),
        }
    }

    /// 合并目录中所有完整的分组
    pub fn reassemble(&self, dir: &Path) -> std::io::Result<ReassemblyReport> {
        let scan = scan_artifacts(dir)?;
        let mut report = ReassemblyReport {
            unparsed: scan.unparsed,
            ..Default::default()
        };

        for group in scan.groups {
            if self.held.contains(&group.base) {
                warn!(
                    "⚠️ {} 有部分未完成，跳过合并 (已有 {} 个部分)",
                    group.base,
                    group.members.len()
                );
                report.held.push(group.base);
                continue;
            }

            match self.merge_group(&group, dir) {
                Ok(path) => {
                    report.merged.insert(group.base, path);
                }
                Err(e) => {
                    warn!("❌ {} 合并失败: {}", group.base, e);
                    report.failed.insert(group.base, e);
                }
            }
        }

        Ok(report)
    }

    /// 合并单个分组，输出写到 `dir/{base}.pdf`
    pub fn merge_group(&self, group: &ArtifactGroup, dir: &Path) -> Result<PathBuf, MergeError> {
        let ordered = group.ordered()?;
        info!(
            "🔗 合并对象文件: {:?}",
            ordered
                .iter()
                .map(|e| e.path.file_name().unwrap_or_default().to_string_lossy())
                .collect::<Vec<_>>()
        );

        let files = ordered
            .iter()
            .map(|entry| PdfFile::open(&entry.path))
            .collect::<Result<Vec<_>, _>>()?;
        let expected_pages: usize = files.iter().map(PdfFile::page_count).sum();

        let mut merged = PdfFile::concat(files)?;
        let output = dir.join(group.output_file_name());
        save_atomic(&mut merged, &output).map_err(|e| match e {
            PdfError::Write { path, source } => MergeError::Persist { path, source },
            other => MergeError::UnreadablePart(other),
        })?;

        info!(
            "✅ PDF 文件已合并: {} ({} 页)",
            output.display(),
            expected_pages
        );

        for entry in ordered {
            match std::fs::remove_file(&entry.path) {
                Ok(()) => debug!("已删除: {}", entry.path.display()),
                Err(e) => warn!("⚠️ 无法删除已合并的部分 {}: {}", entry.path.display(), e),
            }
        }

        Ok(output)
    }
}

/// 用默认设置合并目录中的所有分组
pub fn reassemble(dir: &Path) -> std::io::Result<ReassemblyReport> {
    Reassembler::new().reassemble(dir)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{page_labels, write_numbered_pdf};
    use tempfile::TempDir;

    fn entry(base: &str, index: u32, file: &str) -> ArtifactEntry {
        ArtifactEntry {
            name: PartName::new(base, index),
            path: PathBuf::from(file),
        }
    }

    #[test]
    fn test_ordered_is_numeric_not_lexical() {
        let group = ArtifactGroup {
            base: "doc".to_string(),
            members: vec![
                entry("doc", 2, "doc_part2.pdf"),
                entry("doc", 10, "doc_part10.pdf"),
                entry("doc", 1, "doc_part1.pdf"),
            ],
        };
        let indices: Vec<u32> = group.ordered().unwrap().iter().map(|e| e.name.index).collect();
        assert_eq!(indices, vec![1, 2, 10]);

        let mut members: Vec<ArtifactEntry> = (1..=10)
            .rev()
            .map(|i| entry("doc", i, &format!("doc_part{i}.pdf")))
            .collect();
        members.swap(0, 5);
        let group = ArtifactGroup {
            base: "doc".to_string(),
            members,
        };
        let indices: Vec<u32> = group.ordered().unwrap().iter().map(|e| e.name.index).collect();
        assert_eq!(indices, (1..=10).collect::<Vec<_>>());
    }

    #[test]
    fn test_ordered_rejects_duplicate_index() {
        let group = ArtifactGroup {
            base: "doc".to_string(),
            members: vec![
                entry("doc", 1, "doc_part1.pdf"),
                entry("doc", 1, "doc_part01.pdf"),
            ],
        };
        assert!(matches!(
            group.ordered(),
            Err(MergeError::DuplicateIndex { index: 1, .. })
        ));
    }

    #[test]
    fn test_ordered_rejects_empty_group() {
        assert!(matches!(
            ArtifactGroup::new("doc").ordered(),
            Err(MergeError::EmptyGroup { .. })
        ));
    }

    #[test]
    fn test_scan_groups_by_base_and_ignores_whole_files() {
        let temp = TempDir::new().unwrap();
        for name in ["a_part1.pdf", "a_part2.pdf", "b_part1.pdf", "c.pdf", "a_part.pdf", "x_part1.txt"] {
            std::fs::write(temp.path().join(name), b"x").unwrap();
        }

        let scan = scan_artifacts(temp.path()).unwrap();

        let summary: Vec<(String, usize)> = scan
            .groups
            .iter()
            .map(|g| (g.base.clone(), g.members.len()))
            .collect();
        assert_eq!(summary, vec![("a".to_string(), 2), ("b".to_string(), 1)]);
        assert_eq!(scan.unparsed, vec![temp.path().join("a_part.pdf")]);
    }

    #[test]
    fn test_merge_restores_numeric_order_and_removes_parts() {
        let temp = TempDir::new().unwrap();
        let mut expected = Vec::new();
        for i in 1..=3 {
            expected.extend(write_numbered_pdf(
                &temp.path().join(format!("doc_part{i}.pdf")),
                &format!("p{i}"),
                2,
            ));
        }

        let report = Reassembler::new().reassemble(temp.path()).unwrap();

        let output = temp.path().join("doc.pdf");
        assert_eq!(report.merged.get("doc"), Some(&output));
        assert_eq!(page_labels(&output), expected);
        for i in 1..=3 {
            assert!(!temp.path().join(format!("doc_part{i}.pdf")).exists());
        }
    }

    #[test]
    fn test_merge_accepts_sparse_indices_in_numeric_order() {
        let temp = TempDir::new().unwrap();
        let p2 = write_numbered_pdf(&temp.path().join("doc_part2.pdf"), "p2", 1);
        let p10 = write_numbered_pdf(&temp.path().join("doc_part10.pdf"), "p10", 1);
        let p1 = write_numbered_pdf(&temp.path().join("doc_part1.pdf"), "p1", 1);

        let report = reassemble(temp.path()).unwrap();

        assert!(report.failed.is_empty(), "{:?}", report.failed);
        let output = temp.path().join("doc.pdf");
        assert_eq!(report.merged.get("doc"), Some(&output));
        assert_eq!(page_labels(&output), [p1, p2, p10].concat());
        assert!(!temp.path().join("doc_part10.pdf").exists());
    }

    #[test]
    fn test_failed_group_leaves_no_output_and_keeps_sources() {
        let temp = TempDir::new().unwrap();
        write_numbered_pdf(&temp.path().join("doc_part1.pdf"), "d", 1);
        std::fs::write(temp.path().join("doc_part2.pdf"), b"broken").unwrap();
        write_numbered_pdf(&temp.path().join("other_part1.pdf"), "o", 2);

        let report = Reassembler::new().reassemble(temp.path()).unwrap();

        assert!(matches!(
            report.failed.get("doc"),
            Some(MergeError::UnreadablePart(_))
        ));
        assert!(!temp.path().join("doc.pdf").exists());
        assert!(temp.path().join("doc_part1.pdf").exists());
        assert!(temp.path().join("doc_part2.pdf").exists());

        assert!(report.merged.contains_key("other"));
        assert_eq!(page_labels(&temp.path().join("other.pdf")), vec!["o-1", "o-2"]);
        assert!(report.has_failures());
    }

    #[test]
    fn test_held_groups_are_not_touched() {
        let temp = TempDir::new().unwrap();
        write_numbered_pdf(&temp.path().join("doc_part1.pdf"), "d", 1);

        let report = Reassembler::holding(["doc"]).reassemble(temp.path()).unwrap();

        assert_eq!(report.held, vec!["doc".to_string()]);
        assert!(report.merged.is_empty());
        assert!(temp.path().join("doc_part1.pdf").exists());
        assert!(!temp.path().join("doc.pdf").exists());
    }
}
