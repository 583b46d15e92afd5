//! PDF 读写 - 基础设施层
//!
//! 持有已解析的 PDF，只暴露"按页取出"和"按顺序拼接"两种能力，
//! 不认识文档、部分、分组这些业务概念。

use std::ops::Range;
use std::path::{Path, PathBuf};

use lopdf::{dictionary, Dictionary, Document as LoDocument, Object, ObjectId};
use tracing::debug;

use crate::error::PdfError;

/// 页面可从页面树祖先继承的属性
const INHERITABLE_KEYS: [&[u8]; 4] = [b"Resources", b"MediaBox", b"CropBox", b"Rotate"];

/// 页面树最大深度，防止损坏文件中的环
const MAX_TREE_DEPTH: usize = 64;

/// 已解析的 PDF 文件
pub struct PdfFile {
    path: PathBuf,
    doc: LoDocument,
}

impl PdfFile {
    /// 读取并解析 PDF
    pub fn open(path: impl AsRef<Path>) -> Result<Self, PdfError> {
        let path = path.as_ref().to_path_buf();
        let doc = LoDocument::load(&path).map_err(|source| PdfError::Load {
            path: path.clone(),
            source,
        })?;
        debug!("已读取 PDF: {} ({} 页)", path.display(), doc.get_pages().len());
        Ok(Self { path, doc })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn page_count(&self) -> usize {
        self.doc.get_pages().len()
    }

    /// 取出 `[start, end)` 范围内的页面，生成新的独立文档
    pub fn extract_pages(&self, pages: Range<usize>) -> Result<LoDocument, PdfError> {
        if pages.is_empty() || pages.end > self.page_count() {
            return Err(PdfError::Structure {
                path: self.path.clone(),
                reason: format!(
                    "页面范围 {}..{} 超出文档页数 {}",
                    pages.start,
                    pages.end,
                    self.page_count()
                ),
            });
        }
        assemble(vec![(self.doc.clone(), pages, self.path.clone())])
    }

    /// 按给定顺序拼接多个文件的全部页面
    pub fn concat(files: Vec<PdfFile>) -> Result<LoDocument, PdfError> {
        let selections = files
            .into_iter()
            .map(|file| {
                let count = file.page_count();
                (file.doc, 0..count, file.path)
            })
            .collect();
        assemble(selections)
    }
}

/// 把文档写到临时文件，再原子地重命名为目标路径
///
/// 中途失败或进程被中断时，目标路径要么是完整的旧文件，要么不存在
pub fn save_atomic(doc: &mut LoDocument, dest: &Path) -> Result<(), PdfError> {
    let write_err = |source: std::io::Error| PdfError::Write {
        path: dest.to_path_buf(),
        source,
    };

    let dir = dest
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));

    let mut tmp = tempfile::Builder::new()
        .prefix(".pdf-translate-")
        .suffix(".tmp")
        .tempfile_in(dir)
        .map_err(write_err)?;

    doc.save_to(tmp.as_file_mut())
        .map_err(|e| write_err(std::io::Error::other(e.to_string())))?;
    tmp.as_file().sync_all().map_err(write_err)?;
    tmp.persist(dest).map_err(|e| write_err(e.error))?;

    debug!("已写入: {}", dest.display());
    Ok(())
}

/// 把若干 (文档, 页面范围) 依次拼成一个新文档
fn assemble(selections: Vec<(LoDocument, Range<usize>, PathBuf)>) -> Result<LoDocument, PdfError> {
    let mut out = LoDocument::with_version("1.5");
    let pages_id = out.new_object_id();
    let mut next_id = pages_id.0 + 1;
    let mut kids: Vec<Object> = Vec::new();

    for (mut doc, range, path) in selections {
        doc.renumber_objects_with(next_id);
        next_id = doc.objects.keys().map(|id| id.0).max().unwrap_or(next_id) + 1;

        let page_ids: Vec<ObjectId> = doc
            .get_pages()
            .into_values()
            .skip(range.start)
            .take(range.len())
            .collect();
        if page_ids.len() != range.len() {
            return Err(PdfError::Structure {
                path,
                reason: format!("页面树只有 {} 页，需要 {}", page_ids.len(), range.len()),
            });
        }

        let mut selected = Vec::with_capacity(page_ids.len());
        for page_id in page_ids {
            let mut page = doc
                .get_object(page_id)
                .and_then(Object::as_dict)
                .map_err(|e| PdfError::Structure {
                    path: path.clone(),
                    reason: format!("页面对象 {:?} 无效: {}", page_id, e),
                })?
                .clone();
            inherit_page_attributes(&doc, &mut page);
            page.set("Parent", pages_id);
            selected.push((page_id, page));
        }

        for (id, object) in std::mem::take(&mut doc.objects) {
            if !is_document_structure(&object) {
                out.objects.insert(id, object);
            }
        }
        for (id, page) in selected {
            out.objects.insert(id, Object::Dictionary(page));
            kids.push(Object::Reference(id));
        }
    }

    let count = kids.len() as i64;
    out.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
        }),
    );
    out.max_id = next_id - 1;
    let catalog_id = out.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    out.trailer.set("Root", catalog_id);

    out.prune_objects();
    out.renumber_objects();
    out.compress();
    Ok(out)
}

/// 目录、页面树节点、页面和大纲由 `assemble` 重新构建，不直接复制
fn is_document_structure(object: &Object) -> bool {
    matches!(
        type_name(object),
        Some(b"Catalog" | b"Pages" | b"Page" | b"Outlines" | b"Outline")
    )
}

fn type_name(object: &Object) -> Option<&[u8]> {
    let dict = match object {
        Object::Dictionary(dict) => dict,
        Object::Stream(stream) => &stream.dict,
        _ => return None,
    };
    dict.get(b"Type").and_then(Object::as_name).ok()
}

/// 把页面从页面树祖先继承的属性直接写到页面上
fn inherit_page_attributes(doc: &LoDocument, page: &mut Dictionary) {
    let mut parent = page.get(b"Parent").and_then(Object::as_reference).ok();
    let mut depth = 0;

    while let Some(parent_id) = parent {
        if depth >= MAX_TREE_DEPTH {
            break;
        }
        let Ok(node) = doc.get_object(parent_id).and_then(Object::as_dict) else {
            break;
        };
        for key in INHERITABLE_KEYS {
            if !page.has(key) {
                if let Ok(value) = node.get(key) {
                    page.set(key, value.clone());
                }
            }
        }
        parent = node.get(b"Parent").and_then(Object::as_reference).ok();
        depth += 1;
    }
}
