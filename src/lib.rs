//! Evaluation harness for question-answering LLMs.
//!
//! A run sends every sample of an evaluation set to a [`generator::Generator`]
//! (a local fine-tuned model or a remote chat completion API), once per prompt
//! mode, extracts tagged answers from chain-of-thought output and scores the
//! predictions with exact match, token F1 and ROUGE.
//!
//! Remote generators are driven concurrently by a bounded worker pool; local
//! generators hold an exclusive resource and are always driven sequentially.
//! Results come back in input order either way.

/// Concrete generation backends (OpenAI-compatible HTTP, local program)
pub mod backends;

/// TOML configuration
pub mod config;

/// Error types
pub mod error;

/// Batch evaluation over a generator
pub mod evaluator;

/// Answer extraction from tagged model output
pub mod extract;

/// Generator capability and its local/remote variants
pub mod generator;

/// Exact match, token F1 and ROUGE
pub mod metrics;

/// Question formatting and prompt templates
pub mod prompt;

/// Retry with exponential backoff for remote generators
pub mod resilient;

/// End-to-end runs over all experiments and prompt modes
pub mod runner;

/// Samples and per-sample results
pub mod sample;

/// Sample loading and artifact persistence
pub mod store;

pub use error::EvalError;
pub use evaluator::BatchEvaluator;
pub use generator::{Generator, GeneratorKind};
pub use metrics::{calculate_all_metrics, MetricsSummary};
pub use runner::{Experiment, ExperimentReport, RunReport, Runner};
pub use sample::{EvaluationResult, EvaluationSample};
