use crate::generator::GeneratorKind;

/// Builds the prompt sent to the generator from a sample's full question.
pub type PromptBuilderFn = dyn Fn(&str) -> String + Send + Sync;

/// How a batch is scheduled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionMode {
    /// One sample at a time, in input order.
    Sequential,
    /// A bounded pool of concurrent workers.
    Concurrent { workers: usize },
}

impl ExecutionMode {
    /// Local generators always run sequentially, whatever worker count was
    /// requested. Remote generators get a pool of
    /// `min(requested_workers, sample_count)` workers when more than one
    /// worker is requested.
    pub fn select(kind: GeneratorKind, requested_workers: usize, sample_count: usize) -> Self {
        match kind {
            GeneratorKind::Local => ExecutionMode::Sequential,
            GeneratorKind::Remote if requested_workers <= 1 => ExecutionMode::Sequential,
            GeneratorKind::Remote => ExecutionMode::Concurrent {
                workers: requested_workers.min(sample_count).max(1),
            },
        }
    }
}
