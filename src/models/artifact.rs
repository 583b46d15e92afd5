//! 翻译服务返回的文件

use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use serde::Serialize;

use crate::models::part::PartName;

/// 下载得到的译文文件
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Artifact {
    pub path: PathBuf,
    /// 文件最后修改时间
    pub produced_at: DateTime<Local>,
}

impl Artifact {
    pub fn new(path: impl Into<PathBuf>, produced_at: DateTime<Local>) -> Self {
        Self {
            path: path.into(),
            produced_at,
        }
    }

    /// 读取文件修改时间
    pub fn from_path(path: &Path) -> std::io::Result<Self> {
        let modified = std::fs::metadata(path)?.modified()?;
        Ok(Self::new(path, DateTime::<Local>::from(modified)))
    }

    pub fn file_name(&self) -> Option<&str> {
        self.path.file_name().and_then(|n| n.to_str())
    }

    /// 如果是部分文件，返回解析后的标识
    pub fn part_name(&self) -> Option<PartName> {
        PartName::from_path(&self.path)
    }
}
