pub mod pdf_loader;

pub use pdf_loader::{is_pdf, list_pdf_files, DirectoryListing};
