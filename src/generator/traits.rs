use async_trait::async_trait;

use crate::error::EvalError;

use super::request::GenerationRequest;

/// A generation capability that may be called concurrently through a shared
/// reference, such as an HTTP API client.
#[async_trait]
pub trait SharedGenerator: Send + Sync {
    async fn generate(&self, request: &GenerationRequest) -> Result<String, EvalError>;
}

/// A generation capability backed by an exclusive resource (a local model
/// holding an accelerator context). It can only be driven through a unique
/// borrow, so overlapping calls are ruled out at compile time.
#[async_trait]
pub trait ExclusiveGenerator: Send {
    async fn generate(&mut self, request: &GenerationRequest) -> Result<String, EvalError>;
}
