mod generator;
pub mod providers;

pub use generator::{ContentGenerator, ContentType, GenerationOutcome, GenerationRequest};
pub use providers::{CompletionParams, CompletionProvider};
