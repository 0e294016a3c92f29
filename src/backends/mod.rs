//! Concrete generation backends.

pub mod local;
pub mod openai_compatible;

pub use local::{LocalCommand, LocalCommandConfig};
pub use openai_compatible::{OpenAICompatible, OpenAICompatibleConfig};
