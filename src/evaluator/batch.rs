use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::stream::{FuturesUnordered, StreamExt};
use futures::FutureExt;
use tokio::sync::Semaphore;

use crate::{
    error::EvalError,
    extract::AnswerExtractor,
    generator::{GenerationRequest, Generator, GeneratorKind, SharedGenerator},
    sample::{EvaluationResult, EvaluationSample},
};

use super::types::{ExecutionMode, PromptBuilderFn};

/// Sampling temperature used for evaluation runs.
pub const DEFAULT_TEMPERATURE: f32 = 0.1;

/// Runs a generator over an ordered list of samples.
///
/// Results always come back in input order, one per sample. A sample whose
/// generation fails gets an empty prediction, zero latency and the error
/// message; it never aborts the rest of the batch.
pub struct BatchEvaluator {
    generator: Generator,
    temperature: f32,
    extractor: Arc<AnswerExtractor>,
}

impl BatchEvaluator {
    pub fn new(generator: Generator) -> Self {
        Self {
            generator,
            temperature: DEFAULT_TEMPERATURE,
            extractor: Arc::new(AnswerExtractor::default()),
        }
    }

    /// Sets the sampling temperature passed to every generation.
    pub fn temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    /// Sets the extractor used for chain-of-thought output.
    pub fn extractor(mut self, extractor: AnswerExtractor) -> Self {
        self.extractor = Arc::new(extractor);
        self
    }

    pub fn generator_kind(&self) -> GeneratorKind {
        self.generator.kind()
    }

    /// Evaluates every sample and returns the results in input order.
    ///
    /// With `is_cot` the raw output is passed through the answer extractor and
    /// kept alongside the extracted prediction.
    pub async fn batch_evaluate(
        &mut self,
        samples: &[EvaluationSample],
        prompt_builder: Arc<PromptBuilderFn>,
        max_tokens: u32,
        num_workers: usize,
        is_cot: bool,
    ) -> Vec<EvaluationResult> {
        let kind = self.generator.kind();
        let mode = ExecutionMode::select(kind, num_workers, samples.len());
        if kind == GeneratorKind::Local && num_workers > 1 {
            log::warn!(
                "Local generator is exclusive; ignoring {num_workers} workers and running sequentially"
            );
        }
        log::info!(
            "Evaluating {} samples ({:?}, cot: {})",
            samples.len(),
            mode,
            is_cot
        );

        let task = SampleTask {
            prompt_builder,
            extractor: self.extractor.clone(),
            max_tokens,
            temperature: self.temperature,
            is_cot,
        };

        let results = match (mode, &mut self.generator) {
            (ExecutionMode::Concurrent { workers }, Generator::Remote(shared)) => {
                Self::evaluate_concurrent(shared.clone(), samples, task, workers).await
            }
            (_, generator) => Self::evaluate_sequential(generator, samples, &task).await,
        };

        Self::log_summary(&results, is_cot);
        results
    }

    async fn evaluate_sequential(
        generator: &mut Generator,
        samples: &[EvaluationSample],
        task: &SampleTask,
    ) -> Vec<EvaluationResult> {
        let mut results = Vec::with_capacity(samples.len());
        for (idx, sample) in samples.iter().enumerate() {
            let request = task.request(sample);
            let start = Instant::now();
            let outcome = AssertUnwindSafe(generator.generate(&request))
                .catch_unwind()
                .await;
            let result = match outcome {
                Ok(outcome) => task.finish(sample, outcome, start.elapsed()),
                Err(payload) => {
                    let message = panic_message(payload.as_ref());
                    log::warn!("Evaluation of sample {} aborted: {message}", sample.id);
                    EvaluationResult::failed(
                        sample,
                        format!("evaluation task aborted: {message}"),
                        task.is_cot,
                    )
                }
            };
            results.push(result);
            log::debug!("Sample {}/{} done", idx + 1, samples.len());
        }
        results
    }

    async fn evaluate_concurrent(
        generator: Arc<dyn SharedGenerator>,
        samples: &[EvaluationSample],
        task: SampleTask,
        workers: usize,
    ) -> Vec<EvaluationResult> {
        let task = Arc::new(task);
        let semaphore = Arc::new(Semaphore::new(workers));

        let mut pending: FuturesUnordered<_> = samples
            .iter()
            .cloned()
            .enumerate()
            .map(|(idx, sample)| {
                let generator = generator.clone();
                let task = task.clone();
                let semaphore = semaphore.clone();
                let handle = tokio::spawn(async move {
                    let _permit = semaphore.acquire_owned().await;
                    let request = task.request(&sample);
                    let start = Instant::now();
                    let outcome = generator.generate(&request).await;
                    task.finish(&sample, outcome, start.elapsed())
                });
                async move { (idx, handle.await) }
            })
            .collect();

        // One slot per sample, addressed by input position.
        let mut slots: Vec<Option<EvaluationResult>> = (0..samples.len()).map(|_| None).collect();
        let mut done = 0usize;
        while let Some((idx, joined)) = pending.next().await {
            let result = joined.unwrap_or_else(|err| {
                log::warn!("Evaluation task for sample {idx} aborted: {err}");
                EvaluationResult::failed(
                    &samples[idx],
                    format!("evaluation task aborted: {err}"),
                    task.is_cot,
                )
            });
            slots[idx] = Some(result);
            done += 1;
            log::debug!("Sample {}/{} done", done, samples.len());
        }

        slots
            .into_iter()
            .zip(samples)
            .map(|(slot, sample)| {
                slot.unwrap_or_else(|| {
                    EvaluationResult::failed(sample, "evaluation task never completed", task.is_cot)
                })
            })
            .collect()
    }

    fn log_summary(results: &[EvaluationResult], is_cot: bool) {
        let failed = results.iter().filter(|r| r.is_failed()).count();
        if failed > 0 {
            log::warn!("{failed}/{} samples failed", results.len());
        }
        if is_cot {
            let tagged = results
                .iter()
                .filter(|r| r.has_answer_tags.unwrap_or(false))
                .count();
            log::info!(
                "Evaluation finished - {tagged}/{} answers used answer tags",
                results.len()
            );
        } else {
            log::info!("Evaluation finished - {} samples", results.len());
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "generator panicked".to_string())
}

/// Everything a single sample evaluation needs besides the generator.
struct SampleTask {
    prompt_builder: Arc<PromptBuilderFn>,
    extractor: Arc<AnswerExtractor>,
    max_tokens: u32,
    temperature: f32,
    is_cot: bool,
}

impl SampleTask {
    fn request(&self, sample: &EvaluationSample) -> GenerationRequest {
        GenerationRequest::new(
            (self.prompt_builder)(&sample.full_question),
            self.max_tokens,
            self.temperature,
        )
    }

    fn finish(
        &self,
        sample: &EvaluationSample,
        outcome: Result<String, EvalError>,
        elapsed: Duration,
    ) -> EvaluationResult {
        let raw = match outcome {
            Ok(raw) => raw,
            Err(err) => {
                log::warn!("Sample {} failed: {err}", sample.id);
                return EvaluationResult::failed(sample, err.to_string(), self.is_cot);
            }
        };

        let seconds = elapsed.as_secs_f64();
        if self.is_cot {
            let extraction = self.extractor.extract(&raw);
            EvaluationResult::completed(sample, extraction.answer, seconds)
                .with_extraction(raw, extraction.has_tags)
        } else {
            EvaluationResult::completed(sample, raw, seconds)
        }
    }
}

#[cfg(test)]
#[path = "batch_tests.rs"]
mod tests;
