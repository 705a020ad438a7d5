//! Text generation capability used by the notes pipeline.
//!
//! Title generation, segment summarization and the merge pass all go through
//! [`TextGenerator`]. Calls are independent: no session or conversation state
//! is shared between them.

mod openai;

pub use openai::OpenAIGenerator;

use crate::error::Result;
use async_trait::async_trait;

/// Trait for text generation backends.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Generate a response for a single prompt.
    ///
    /// Failures (transport, quota, malformed or empty response) are reported as
    /// [`LecternError::Generation`](crate::error::LecternError::Generation).
    async fn generate(&self, prompt: &str) -> Result<String>;

    /// Model identifier, for logging.
    fn model(&self) -> &str;
}
