pub mod js_executor;
pub mod pdf_file;

pub use js_executor::JsExecutor;
pub use pdf_file::{save_atomic, PdfFile};
