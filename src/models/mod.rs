pub mod artifact;
pub mod document;
pub mod loaders;
pub mod part;
pub mod unit;

pub use artifact::Artifact;
pub use document::{Document, DocumentId};
pub use loaders::{list_pdf_files, DirectoryListing};
pub use part::{Part, PartName, PART_MARKER};
pub use unit::{UnitId, WorkUnit};
