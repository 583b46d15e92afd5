pub mod translation_client;

pub use translation_client::{SubmissionHandle, TranslationClient};
