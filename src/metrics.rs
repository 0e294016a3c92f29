//! Aggregate quality metrics over a finished result list.
//!
//! Quality scores compare `prediction` with `reference` only, so zero-shot
//! and chain-of-thought runs are scored identically; the raw
//! chain-of-thought output never reaches the scorers.

#[path = "metrics/tokenize.rs"]
mod tokenize;

#[path = "metrics/overlap.rs"]
mod overlap;

#[path = "metrics/rouge.rs"]
mod rouge;

#[path = "metrics/summary.rs"]
mod summary;

pub use overlap::{exact_match, token_f1, F1Score};
pub use rouge::{rouge_l, rouge_n, RougeScore};
pub use summary::{calculate_all_metrics, MetricsSummary, RougeScores};
pub use tokenize::{rouge_tokens, tokenize};
