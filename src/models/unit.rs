//! 提交单元：整份文档或拆分后的一个部分

use std::fmt::Display;
use std::path::Path;

use serde::Serialize;

use crate::models::document::{Document, DocumentId};
use crate::models::part::Part;

/// 单元标识：所属文档 + 部分序号（整份文档为 `None`）
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct UnitId {
    pub document: DocumentId,
    pub part: Option<u32>,
}

impl UnitId {
    pub fn whole(document: DocumentId) -> Self {
        Self {
            document,
            part: None,
        }
    }

    pub fn part(document: DocumentId, index: u32) -> Self {
        Self {
            document,
            part: Some(index),
        }
    }
}

impl Display for UnitId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.part {
            Some(index) => write!(f, "{}#{}", self.document, index),
            None => write!(f, "{}", self.document),
        }
    }
}

/// 需要提交给翻译服务的一个单元
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum WorkUnit {
    /// 未拆分，原样提交
    Whole(Document),
    /// 拆分后的一个部分
    Part(Part),
}

impl WorkUnit {
    pub fn id(&self) -> UnitId {
        match self {
            WorkUnit::Whole(doc) => UnitId::whole(doc.id.clone()),
            WorkUnit::Part(part) => UnitId::part(part.document.clone(), part.index),
        }
    }

    pub fn document_id(&self) -> &DocumentId {
        match self {
            WorkUnit::Whole(doc) => &doc.id,
            WorkUnit::Part(part) => &part.document,
        }
    }

    pub fn path(&self) -> &Path {
        match self {
            WorkUnit::Whole(doc) => &doc.path,
            WorkUnit::Part(part) => &part.path,
        }
    }

    pub fn is_part(&self) -> bool {
        matches!(self, WorkUnit::Part(_))
    }
}
