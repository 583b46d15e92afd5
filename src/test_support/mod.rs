//! 单元测试与集成测试共用的夹具（`test-utils` 特性）

pub mod client;
pub mod pdf;

pub use client::{Script, ScriptedClient};
pub use pdf::{file_names, page_labels, write_labelled_pdf, write_numbered_pdf, LABEL_KEY};
