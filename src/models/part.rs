//! 部分文件命名
//!
//! 拆分出的文件统一命名为 `{base}_part{index}.pdf`。翻译服务返回的文件可能带有前缀或后缀，
//! 例如 `al-{base}_part{index}_ja.pdf`，这里只在创建或扫描时解析一次，得到带类型的标识。

use std::fmt::Display;
use std::ops::Range;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use regex::Regex;
use serde::Serialize;

use crate::models::document::DocumentId;

/// 部分标记
pub const PART_MARKER: &str = "_part";

fn part_name_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    // base 贪婪匹配，取最后一个 `_part<数字>` 作为标记
    RE.get_or_init(|| {
        Regex::new(r"^(?P<base>.+)_part(?P<index>[0-9]+)(?P<tail>.*)\.(?i:pdf)$")
            .expect("内置正则必须有效")
    })
}

/// 部分文件的类型化标识：所属基础名 + 序号（从 1 开始）
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct PartName {
    pub base: String,
    pub index: u32,
}

impl PartName {
    pub fn new(base: impl Into<String>, index: u32) -> Self {
        Self {
            base: base.into(),
            index,
        }
    }

    /// 从文件名解析
    ///
    /// 不是 PDF、没有部分标记、或序号超出范围时返回 `None`
    pub fn parse(file_name: &str) -> Option<Self> {
        let caps = part_name_regex().captures(file_name)?;
        let index = caps.name("index")?.as_str().parse().ok()?;
        Some(Self {
            base: caps.name("base")?.as_str().to_string(),
            index,
        })
    }

    /// 从路径解析（只看文件名部分）
    pub fn from_path(path: &Path) -> Option<Self> {
        path.file_name().and_then(|n| n.to_str()).and_then(Self::parse)
    }

    /// 规范文件名
    pub fn file_name(&self) -> String {
        format!("{}{}{}.pdf", self.base, PART_MARKER, self.index)
    }
}

impl Display for PartName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}{}{}", self.base, PART_MARKER, self.index)
    }
}

/// 文件名中是否包含部分标记（不要求能解析）
pub fn has_part_marker(file_name: &str) -> bool {
    file_name.contains(PART_MARKER)
}

/// 拆分得到的一个部分
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Part {
    /// 所属文档
    pub document: DocumentId,
    /// 序号（从 1 开始）
    pub index: u32,
    /// 页面范围 `[start, end)`，从 0 开始
    pub pages: Range<usize>,
    /// 部分文件路径
    pub path: PathBuf,
}

impl Part {
    pub fn name(&self) -> PartName {
        PartName::new(self.document.as_str(), self.index)
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }
}
