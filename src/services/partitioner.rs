//! 文档拆分 - 业务能力层
//!
//! 页数或体积超过阈值的文档按固定页数切成若干部分，每个部分立即写成独立文件，
//! 以便马上提交。没有超过阈值的文档原样返回，不复制也不改名。

use std::ops::Range;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::error::SplitError;
use crate::infrastructure::{save_atomic, PdfFile};
use crate::models::{Document, Part, PartName, WorkUnit};

/// 拆分阈值
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SplitLimits {
    pub max_pages: usize,
    pub max_size_bytes: u64,
}

impl SplitLimits {
    /// 页数和体积都在阈值以内
    pub fn fits(&self, document: &Document) -> bool {
        document.page_count <= self.max_pages && document.size_bytes <= self.max_size_bytes
    }
}

/// 把 `page_count` 页按每段 `max_pages` 页切分，最后一段可以更短
pub fn page_windows(page_count: usize, max_pages: usize) -> Vec<Range<usize>> {
    if max_pages == 0 {
        return Vec::new();
    }
    (0..page_count)
        .step_by(max_pages)
        .map(|start| start..(start + max_pages).min(page_count))
        .collect()
}

/// 拆分器
#[derive(Debug, Clone)]
pub struct Partitioner {
    limits: SplitLimits,
    output_dir: PathBuf,
}

impl Partitioner {
    /// `output_dir`：部分文件写入的目录
    pub fn new(limits: SplitLimits, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            limits,
            output_dir: output_dir.into(),
        }
    }

    pub fn limits(&self) -> SplitLimits {
        self.limits
    }

    /// 拆分单个文档
    ///
    /// 返回按顺序排列的提交单元。任何一个部分写入失败时，已写出的部分会被删除。
    pub fn partition(&self, document: &Document) -> Result<Vec<WorkUnit>, SplitError> {
        if self.limits.max_pages == 0 {
            return Err(SplitError::ZeroPageLimit);
        }
        if document.page_count == 0 {
            return Err(SplitError::Empty {
                path: document.path.clone(),
            });
        }

        if self.limits.fits(document) {
            debug!(
                "{} 的页数 ({}) 和大小 ({} 字节) 都符合条件，无需拆分",
                document.id, document.page_count, document.size_bytes
            );
            return Ok(vec![WorkUnit::Whole(document.clone())]);
        }

        let source = PdfFile::open(&document.path)?;
        let page_count = source.page_count();
        if page_count == 0 {
            return Err(SplitError::Empty {
                path: document.path.clone(),
            });
        }

        let windows = page_windows(page_count, self.limits.max_pages);
        let mut parts: Vec<Part> = Vec::with_capacity(windows.len());

        for (offset, pages) in windows.into_iter().enumerate() {
            let index = offset as u32 + 1;
            let path = self
                .output_dir
                .join(PartName::new(document.id.as_str(), index).file_name());

            let written = source
                .extract_pages(pages.clone())
                .and_then(|mut doc| save_atomic(&mut doc, &path));

            if let Err(e) = written {
                remove_written_parts(&parts);
                return Err(SplitError::Unreadable(e));
            }

            parts.push(Part {
                document: document.id.clone(),
                index,
                pages,
                path,
            });
        }

        info!(
            "✂️ {} 已拆分为 {} 个部分: {:?}",
            document.id,
            parts.len(),
            parts
                .iter()
                .map(|p| p.name().file_name())
                .collect::<Vec<_>>()
        );

        Ok(parts.into_iter().map(WorkUnit::Part).collect())
    }
}

fn remove_written_parts(parts: &[Part]) {
    for part in parts {
        if let Err(e) = std::fs::remove_file(&part.path) {
            warn!("无法删除未完成的部分文件 {}: {}", part.path.display(), e);
        }
    }
}

/// 按默认输出目录（源文件所在目录）拆分
pub fn partition(
    document: &Document,
    max_pages: usize,
    max_size_bytes: u64,
) -> Result<Vec<WorkUnit>, SplitError> {
    let output_dir = document
        .path
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."));
    Partitioner::new(
        SplitLimits {
            max_pages,
            max_size_bytes,
        },
        output_dir,
    )
    .partition(document)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{page_labels, write_numbered_pdf};
    use tempfile::TempDir;

    fn limits(max_pages: usize, max_size_bytes: u64) -> SplitLimits {
        SplitLimits {
            max_pages,
            max_size_bytes,
        }
    }

    #[test]
    fn test_page_windows_cover_every_page_once() {
        assert_eq!(page_windows(250, 100), vec![0..100, 100..200, 200..250]);
        assert_eq!(page_windows(100, 100), vec![0..100]);
        assert_eq!(page_windows(3, 1), vec![0..1, 1..2, 2..3]);
        assert!(page_windows(0, 10).is_empty());
        assert!(page_windows(10, 0).is_empty());
    }

    #[test]
    fn test_document_within_limits_is_returned_as_is() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("small.pdf");
        write_numbered_pdf(&path, "s", 3);
        let document = Document::inspect(&path).unwrap();

        let units = Partitioner::new(limits(3, u64::MAX), temp.path())
            .partition(&document)
            .unwrap();

        assert_eq!(units, vec![WorkUnit::Whole(document)]);
        // 没有生成新文件
        assert_eq!(std::fs::read_dir(temp.path()).unwrap().count(), 1);
    }

    #[test]
    fn test_split_by_page_count() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("book.pdf");
        let labels = write_numbered_pdf(&path, "b", 5);
        let document = Document::inspect(&path).unwrap();

        let units = Partitioner::new(limits(2, u64::MAX), temp.path())
            .partition(&document)
            .unwrap();

        assert_eq!(units.len(), 3);
        let mut seen = Vec::new();
        for (i, unit) in units.iter().enumerate() {
            let WorkUnit::Part(part) = unit else {
                panic!("应该是部分: {:?}", unit);
            };
            assert_eq!(part.index, i as u32 + 1);
            assert_eq!(
                part.path.file_name().unwrap().to_str().unwrap(),
                format!("book_part{}.pdf", i + 1)
            );
            seen.extend(page_labels(&part.path));
        }
        assert_eq!(seen, labels);
    }

    #[test]
    fn test_oversized_document_is_split_even_within_page_limit() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("heavy.pdf");
        write_numbered_pdf(&path, "h", 2);
        let document = Document::inspect(&path).unwrap();

        let units = Partitioner::new(limits(10, 1), temp.path())
            .partition(&document)
            .unwrap();

        assert_eq!(units.len(), 1);
        assert!(units[0].is_part());
        assert!(temp.path().join("heavy_part1.pdf").exists());
    }

    #[test]
    fn test_parts_can_be_written_to_another_directory() {
        let temp = TempDir::new().unwrap();
        let out = TempDir::new().unwrap();
        let path = temp.path().join("doc.pdf");
        write_numbered_pdf(&path, "d", 3);
        let document = Document::inspect(&path).unwrap();

        Partitioner::new(limits(2, u64::MAX), out.path())
            .partition(&document)
            .unwrap();

        assert!(out.path().join("doc_part1.pdf").exists());
        assert!(out.path().join("doc_part2.pdf").exists());
        assert!(!temp.path().join("doc_part1.pdf").exists());
    }

    #[test]
    fn test_zero_page_limit_is_rejected() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("doc.pdf");
        write_numbered_pdf(&path, "d", 1);
        let document = Document::inspect(&path).unwrap();

        let err = Partitioner::new(limits(0, u64::MAX), temp.path())
            .partition(&document)
            .unwrap_err();
        assert!(matches!(err, SplitError::ZeroPageLimit));
    }

    #[test]
    fn test_unreadable_source_fails_only_that_document() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("broken.pdf");
        std::fs::write(&path, b"definitely not a pdf").unwrap();

        assert!(matches!(
            Document::inspect(&path),
            Err(SplitError::Unreadable(_))
        ));
    }

    #[test]
    fn test_free_function_writes_next_to_source() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("doc.pdf");
        write_numbered_pdf(&path, "d", 4);
        let document = Document::inspect(&path).unwrap();

        let units = partition(&document, 3, u64::MAX).unwrap();
        assert_eq!(units.len(), 2);
        assert!(temp.path().join("doc_part2.pdf").exists());
    }
}
