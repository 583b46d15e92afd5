//! 集成测试共用：配置工厂，夹具来自 `test_support`

#![allow(dead_code)]

use std::path::Path;
use std::time::Duration;

use pdf_translate_batch::Config;

pub use pdf_translate_batch::test_support::{
    file_names, page_labels, write_numbered_pdf, Script, ScriptedClient,
};

/// 指向临时目录、没有等待时间的配置
pub fn test_config(working: &Path, staging: &Path, max_pages: usize) -> Config {
    Config {
        max_pages,
        working_dir: working.to_path_buf(),
        staging_dir: staging.to_path_buf(),
        max_concurrent_units: 3,
        unit_timeout: Duration::from_secs(5),
        settle_delay: Duration::ZERO,
        output_log_file: staging.join("unused.log"),
        ..Config::default()
    }
}
