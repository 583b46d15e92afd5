//! 测试用 PDF：每页带一个自定义标签，便于核对页序

use std::path::Path;

use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document as LoDocument, Object, Stream};

pub const LABEL_KEY: &str = "FixtureLabel";

pub fn write_labelled_pdf(path: &Path, labels: &[String]) {
    let mut doc = LoDocument::with_version("1.5");
    let pages_id = doc.new_object_id();
    let mut kids = Vec::new();

    for label in labels {
        let content = Content {
            operations: vec![
                Operation::new("re", vec![10.into(), 10.into(), 50.into(), 50.into()]),
                Operation::new("f", vec![]),
            ],
        };
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
            LABEL_KEY => Object::string_literal(label.as_str()),
        });
        kids.push(Object::Reference(page_id));
    }

    let count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
            "MediaBox" => vec![0.into(), 0.into(), 200.into(), 200.into()],
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);
    doc.save(path).unwrap();
}

/// 生成 `count` 页，标签为 `{prefix}-1` .. `{prefix}-{count}`
pub fn write_numbered_pdf(path: &Path, prefix: &str, count: usize) -> Vec<String> {
    let labels: Vec<String> = (1..=count).map(|i| format!("{prefix}-{i}")).collect();
    write_labelled_pdf(path, &labels);
    labels
}

pub fn page_labels(path: &Path) -> Vec<String> {
    let doc = LoDocument::load(path).unwrap();
    doc.get_pages()
        .into_values()
        .map(|page_id| {
            let page = doc.get_object(page_id).unwrap().as_dict().unwrap();
            let raw = page.get(LABEL_KEY.as_bytes()).unwrap().as_str().unwrap();
            String::from_utf8(raw.to_vec()).unwrap()
        })
        .collect()
}

/// 目录中的文件名，已排序
pub fn file_names(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}
