use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tokio::fs;

/// 目录的一次性快照
#[derive(Debug, Clone, Default)]
pub struct DirectoryListing {
    /// 所有 `.pdf` 文件（按文件名排序）
    pub pdf_files: Vec<PathBuf>,
    /// 目录中全部条目的文件名
    pub names: BTreeSet<String>,
}

impl DirectoryListing {
    pub fn contains(&self, file_name: &str) -> bool {
        self.names.contains(file_name)
    }
}

pub fn is_pdf(path: &Path) -> bool {
    path.extension()
        .and_then(|s| s.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"))
}

/// 扫描文件夹，列出其中的 PDF 文件
pub async fn list_pdf_files(folder: &Path) -> Result<DirectoryListing> {
    if !fs::try_exists(folder).await.unwrap_or(false) {
        anyhow::bail!("文件夹不存在: {}", folder.display());
    }

    let mut listing = DirectoryListing::default();
    let mut entries = fs::read_dir(folder)
        .await
        .with_context(|| format!("无法读取文件夹: {}", folder.display()))?;

    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        let name = entry.file_name().to_string_lossy().into_owned();
        listing.names.insert(name);

        let is_file = entry.file_type().await.map(|t| t.is_file()).unwrap_or(false);
        if is_file && is_pdf(&path) {
            listing.pdf_files.push(path);
        }
    }

    listing.pdf_files.sort();
    tracing::debug!(
        "{} 中共有 {} 个 PDF 文件",
        folder.display(),
        listing.pdf_files.len()
    );
    Ok(listing)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_lists_only_pdf_files_sorted() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join("b.pdf"), b"x").unwrap();
        std::fs::write(temp.path().join("a.PDF"), b"x").unwrap();
        std::fs::write(temp.path().join("notes.txt"), b"x").unwrap();
        std::fs::create_dir(temp.path().join("dir.pdf")).unwrap();

        let listing = list_pdf_files(temp.path()).await.unwrap();

        let names: Vec<_> = listing
            .pdf_files
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["a.PDF", "b.pdf"]);
        assert!(listing.contains("notes.txt"));
        assert!(listing.contains("dir.pdf"));
    }

    #[tokio::test]
    async fn test_missing_folder_is_an_error() {
        let temp = TempDir::new().unwrap();
        assert!(list_pdf_files(&temp.path().join("nope")).await.is_err());
    }
}
