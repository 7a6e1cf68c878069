mod openai;

pub use openai::OpenAiProvider;

use crate::Result;

/// Sampling settings for a single completion call
#[derive(Debug, Clone, Copy)]
pub struct CompletionParams {
    pub max_tokens: u32,
    pub temperature: f32,
}

/// Trait for chat-completion backends
#[async_trait::async_trait]
pub trait CompletionProvider: Send + Sync {
    /// Run one completion with a system prompt and a user prompt
    async fn complete(
        &self,
        system: &str,
        user: &str,
        params: &CompletionParams,
    ) -> Result<String>;
}
