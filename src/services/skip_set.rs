//! 跳过规则 - 业务能力层
//!
//! 带译文前缀的文件（如 `al-report.pdf`）如果去掉前缀后的原文件（`report.pdf`）仍在目录中，
//! 说明它是上一次运行的产物，不再拆分也不再提交。
//! 只针对带前缀的文件名，不带前缀的文档不参与这一判断。

use crate::models::DirectoryListing;

/// 跳过规则
#[derive(Debug, Clone)]
pub struct SkipSet {
    prefix: String,
}

impl SkipSet {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    /// 去掉前缀后的文件名；不带前缀时返回 `None`
    pub fn strip<'a>(&self, file_name: &'a str) -> Option<&'a str> {
        if self.prefix.is_empty() {
            return None;
        }
        file_name
            .strip_prefix(self.prefix.as_str())
            .filter(|rest| !rest.is_empty())
    }

    /// 如果应跳过，返回已存在的原文件名
    pub fn original_for<'a>(&self, file_name: &'a str, listing: &DirectoryListing) -> Option<&'a str> {
        self.strip(file_name)
            .filter(|stripped| listing.contains(stripped))
    }

    pub fn should_skip(&self, file_name: &str, listing: &DirectoryListing) -> bool {
        self.original_for(file_name, listing).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn listing(names: &[&str]) -> DirectoryListing {
        DirectoryListing {
            pdf_files: Vec::new(),
            names: names.iter().map(|n| n.to_string()).collect(),
        }
    }

    #[test]
    fn test_skips_translation_when_original_exists() {
        let skip = SkipSet::new("al-");
        let dir = listing(&["al-report.pdf", "report.pdf"]);

        assert!(skip.should_skip("al-report.pdf", &dir));
        assert_eq!(skip.original_for("al-report.pdf", &dir), Some("report.pdf"));
        assert!(!skip.should_skip("report.pdf", &dir));
    }

    #[test]
    fn test_keeps_prefixed_file_without_original() {
        let skip = SkipSet::new("al-");
        let dir = listing(&["al-report.pdf"]);
        assert!(!skip.should_skip("al-report.pdf", &dir));
    }

    #[test]
    fn test_only_leading_prefix_is_stripped() {
        let skip = SkipSet::new("al-");
        let dir = listing(&["final-report.pdf", "report.pdf", "fin-report.pdf"]);
        // "al-" 出现在中间时不算前缀
        assert!(!skip.should_skip("final-report.pdf", &dir));
        assert_eq!(skip.strip("al-al-x.pdf"), Some("al-x.pdf"));
    }

    #[test]
    fn test_empty_prefix_never_skips() {
        let skip = SkipSet::new("");
        let dir = listing(&["report.pdf"]);
        assert!(!skip.should_skip("report.pdf", &dir));
    }
}
