#[path = "evaluator/types.rs"]
mod types;

#[path = "evaluator/batch.rs"]
mod batch;

pub use batch::{BatchEvaluator, DEFAULT_TEMPERATURE};
pub use types::{ExecutionMode, PromptBuilderFn};
