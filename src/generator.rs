#[path = "generator/request.rs"]
mod request;

#[path = "generator/traits.rs"]
mod traits;

#[path = "generator/handle.rs"]
mod handle;

pub use handle::{Generator, GeneratorKind};
pub use request::GenerationRequest;
pub use traits::{ExclusiveGenerator, SharedGenerator};

#[path = "generator/build.rs"]
mod build;
