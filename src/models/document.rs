//! 源文档

use std::fmt::Display;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::error::SplitError;
use crate::infrastructure::PdfFile;

/// 文档标识：文件名去掉扩展名后的基础名，拆分与合并前后保持不变
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct DocumentId(String);

impl DocumentId {
    pub fn new(base_name: impl Into<String>) -> Self {
        Self(base_name.into())
    }

    /// 从路径的文件名（去掉扩展名）得到标识
    pub fn from_path(path: &Path) -> Option<Self> {
        path.file_stem()
            .and_then(|s| s.to_str())
            .filter(|s| !s.is_empty())
            .map(Self::new)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for DocumentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// 工作目录中发现的一个 PDF 文档
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Document {
    pub id: DocumentId,
    pub path: PathBuf,
    pub page_count: usize,
    pub size_bytes: u64,
}

impl Document {
    /// 读取文件大小和页数
    pub fn inspect(path: &Path) -> Result<Self, SplitError> {
        let id = DocumentId::from_path(path).ok_or_else(|| SplitError::InvalidName {
            path: path.to_path_buf(),
        })?;
        let size_bytes = std::fs::metadata(path)
            .map_err(|source| SplitError::Metadata {
                path: path.to_path_buf(),
                source,
            })?
            .len();
        let page_count = PdfFile::open(path)?.page_count();

        Ok(Self {
            id,
            path: path.to_path_buf(),
            page_count,
            size_bytes,
        })
    }

    /// 文件名（含扩展名）
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| format!("{}.pdf", self.id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_id_from_path_strips_extension() {
        let id = DocumentId::from_path(Path::new("/tmp/work/report.pdf")).unwrap();
        assert_eq!(id.as_str(), "report");
        assert_eq!(id.to_string(), "report");
    }

    #[test]
    fn test_id_from_path_without_name() {
        assert_eq!(DocumentId::from_path(Path::new("/")), None);
    }
}
