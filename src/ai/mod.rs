//! Generative-language service integration
//!
//! Provides the upstream seam used by the report proxy: a trait for turning a
//! multimodal `generateContent` request into report text, the Gemini REST
//! implementation and a scripted mock.

pub mod gemini;
pub mod mime;
pub mod mock;

pub use gemini::GeminiClient;
pub use mock::MockContentGenerator;

use crate::wire::GenerateContentRequest;
use crate::Result;
use async_trait::async_trait;

#[async_trait]
pub trait ContentGenerator: Send + Sync {
    /// Run one generation call and return the first candidate's text.
    ///
    /// Implementations never return `Ok` with an empty string.
    async fn generate(&self, request: &GenerateContentRequest) -> Result<String>;
}
