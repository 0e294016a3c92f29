//! End-to-end evaluation runs: every configured experiment, each a generator
//! setup run in every prompt mode over one sample set, with artifacts written
//! per experiment and mode.

use std::fmt::Write as _;
use std::path::PathBuf;
use std::sync::Arc;

use crate::{
    config::{AppConfig, GeneratorConfig},
    error::EvalError,
    evaluator::{BatchEvaluator, PromptBuilderFn},
    extract::AnswerExtractor,
    generator::{Generator, GeneratorKind},
    metrics::{calculate_all_metrics, MetricsSummary},
    prompt::PromptMode,
    sample::EvaluationSample,
    store,
};

/// A generator setup of a run and the directory its artifacts go to.
#[derive(Debug, Clone, PartialEq)]
pub struct Experiment {
    pub name: String,
    pub generator: GeneratorConfig,
    pub output_dir: PathBuf,
}

/// Outcome of one prompt mode.
#[derive(Debug, Clone)]
pub struct ModeReport {
    pub mode: PromptMode,
    pub summary: MetricsSummary,
    pub predictions_path: PathBuf,
    pub metrics_path: PathBuf,
}

/// Per-mode summaries of one experiment, in execution order.
#[derive(Debug, Clone)]
pub struct ExperimentReport {
    pub name: String,
    pub kind: GeneratorKind,
    pub modes: Vec<ModeReport>,
}

impl ExperimentReport {
    pub fn get(&self, mode: PromptMode) -> Option<&ModeReport> {
        self.modes.iter().find(|report| report.mode == mode)
    }

    /// Zero-shot vs chain-of-thought table, when both modes ran.
    pub fn comparison(&self) -> Option<String> {
        let zero_shot = &self.get(PromptMode::ZeroShot)?.summary;
        let cot = &self.get(PromptMode::Cot)?.summary;

        let rows: [(&str, f64, f64, Unit); 6] = [
            ("Exact match", zero_shot.exact_match, cot.exact_match, Unit::Percent),
            ("Average F1", zero_shot.avg_f1, cot.avg_f1, Unit::Score),
            (
                "ROUGE-1",
                zero_shot.rouge_scores.rouge1,
                cot.rouge_scores.rouge1,
                Unit::Score,
            ),
            (
                "ROUGE-2",
                zero_shot.rouge_scores.rouge2,
                cot.rouge_scores.rouge2,
                Unit::Score,
            ),
            (
                "ROUGE-L",
                zero_shot.rouge_scores.rouge_l,
                cot.rouge_scores.rouge_l,
                Unit::Score,
            ),
            (
                "Avg inference time",
                zero_shot.avg_inference_time_seconds,
                cot.avg_inference_time_seconds,
                Unit::Seconds,
            ),
        ];

        let mut out = format!(
            "{:<20} {:>12} {:>12} {:>12}\n",
            "Metric", "zero_shot", "cot", "delta"
        );
        for (name, before, after, unit) in rows {
            let _ = writeln!(
                out,
                "{:<20} {:>12} {:>12} {:>12}",
                name,
                unit.format(before, false),
                unit.format(after, false),
                unit.format(after - before, true),
            );
        }
        Some(out.trim_end().to_string())
    }
}

/// Summaries of a finished run, one entry per experiment in execution order.
#[derive(Debug, Clone, Default)]
pub struct RunReport {
    pub experiments: Vec<ExperimentReport>,
}

impl RunReport {
    pub fn experiment(&self, name: &str) -> Option<&ExperimentReport> {
        self.experiments.iter().find(|report| report.name == name)
    }

    /// With one experiment, its zero-shot vs chain-of-thought table. With
    /// several, a table of every experiment and mode followed by the
    /// fine-tuning gain, the chain-of-thought gain of each experiment and the
    /// best-scoring combination.
    pub fn comparison(&self) -> Option<String> {
        match self.experiments.as_slice() {
            [] => None,
            [only] => only.comparison(),
            many => Some(cross_comparison(many)),
        }
    }
}

fn cross_comparison(experiments: &[ExperimentReport]) -> String {
    let mut out = format!(
        "{:<20} {:<10} {:>12} {:>10} {:>10} {:>10}\n",
        "Experiment", "Mode", "Exact match", "Avg F1", "ROUGE-L", "Time"
    );
    for experiment in experiments {
        for report in &experiment.modes {
            let summary = &report.summary;
            let _ = writeln!(
                out,
                "{:<20} {:<10} {:>12} {:>10} {:>10} {:>10}",
                experiment.name,
                report.mode.as_str(),
                Unit::Percent.format(summary.exact_match, false),
                Unit::Score.format(summary.avg_f1, false),
                Unit::Score.format(summary.rouge_scores.rouge_l, false),
                Unit::Seconds.format(summary.avg_inference_time_seconds, false),
            );
        }
    }

    let baseline = experiments.iter().find(|e| e.kind == GeneratorKind::Remote);
    let tuned = experiments.iter().find(|e| e.kind == GeneratorKind::Local);
    if let (Some(baseline), Some(tuned)) = (baseline, tuned) {
        for report in &tuned.modes {
            let Some(reference) = baseline.get(report.mode) else {
                continue;
            };
            let _ = writeln!(
                out,
                "Fine-tuning gain ({}, {} vs {}): F1 {}",
                report.mode,
                tuned.name,
                baseline.name,
                gain(reference.summary.avg_f1, report.summary.avg_f1),
            );
        }
    }

    for experiment in experiments {
        if let (Some(zero_shot), Some(cot)) = (
            experiment.get(PromptMode::ZeroShot),
            experiment.get(PromptMode::Cot),
        ) {
            let _ = writeln!(
                out,
                "CoT gain ({}): F1 {}",
                experiment.name,
                gain(zero_shot.summary.avg_f1, cot.summary.avg_f1),
            );
        }
    }

    let best = experiments
        .iter()
        .flat_map(|e| e.modes.iter().map(move |report| (e, report)))
        .max_by(|(_, a), (_, b)| a.summary.avg_f1.total_cmp(&b.summary.avg_f1));
    if let Some((experiment, report)) = best {
        let _ = writeln!(
            out,
            "Best: {} / {} (F1 {})",
            experiment.name,
            report.mode,
            Unit::Score.format(report.summary.avg_f1, false),
        );
    }
    out.trim_end().to_string()
}

/// Absolute change, plus the relative change when the base is non-zero.
fn gain(before: f64, after: f64) -> String {
    let delta = Unit::Score.format(after - before, true);
    if before > 0.0 {
        format!("{delta} ({:+.1}%)", (after - before) / before * 100.0)
    } else {
        delta
    }
}

#[derive(Clone, Copy)]
enum Unit {
    Percent,
    Score,
    Seconds,
}

impl Unit {
    fn format(self, value: f64, signed: bool) -> String {
        match (self, signed) {
            (Unit::Percent, false) => format!("{:.2}%", value * 100.0),
            (Unit::Percent, true) => format!("{:+.2}%", value * 100.0),
            (Unit::Score, false) => format!("{value:.4}"),
            (Unit::Score, true) => format!("{value:+.4}"),
            (Unit::Seconds, false) => format!("{value:.2}s"),
            (Unit::Seconds, true) => format!("{value:+.2}s"),
        }
    }
}

/// Drives a complete evaluation from an [`AppConfig`].
pub struct Runner {
    config: AppConfig,
}

impl Runner {
    pub fn new(config: AppConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// The experiments of this run. Without an `[[experiments]]` list the
    /// `[generator]` section runs alone and writes straight into
    /// `evaluation.output_dir`; named experiments get a subdirectory each.
    pub fn experiments(&self) -> Vec<Experiment> {
        let root = &self.config.evaluation.output_dir;
        if self.config.experiments.is_empty() {
            return vec![Experiment {
                name: self.config.generator.kind.to_string(),
                generator: self.config.generator.clone(),
                output_dir: root.clone(),
            }];
        }
        self.config
            .experiments
            .iter()
            .map(|experiment| Experiment {
                name: experiment.name.clone(),
                generator: experiment.generator.clone(),
                output_dir: root.join(&experiment.name),
            })
            .collect()
    }

    /// Loads the samples, builds every experiment's generator and runs them
    /// in order. Generators are all built before the first request is sent.
    pub async fn run(&self) -> Result<RunReport, EvalError> {
        let samples = store::load_samples_with_label(
            &self.config.evaluation.eval_file,
            &self.config.prompt.supplement_label,
        )?;
        let mut planned = Vec::new();
        for experiment in self.experiments() {
            let generator = Generator::from_config(&experiment.generator, &self.config.resilience)?;
            planned.push((experiment, generator));
        }
        self.run_with(planned, &samples).await
    }

    /// Runs each experiment with its generator over `samples`.
    pub async fn run_with<I>(
        &self,
        planned: I,
        samples: &[EvaluationSample],
    ) -> Result<RunReport, EvalError>
    where
        I: IntoIterator<Item = (Experiment, Generator)>,
    {
        let mut report = RunReport::default();
        for (experiment, generator) in planned {
            log::info!(
                "Starting experiment {} ({} generator)",
                experiment.name,
                generator.kind()
            );
            let outcome = self.run_experiment(&experiment, generator, samples).await?;
            report.experiments.push(outcome);
        }

        if let Some(table) = report.comparison() {
            log::info!("Comparison:\n{table}");
        }
        Ok(report)
    }

    /// Runs every configured mode of one experiment.
    pub async fn run_experiment(
        &self,
        experiment: &Experiment,
        generator: Generator,
        samples: &[EvaluationSample],
    ) -> Result<ExperimentReport, EvalError> {
        let evaluation = &self.config.evaluation;
        let kind = generator.kind();
        let mut workers = evaluation.workers.max(1);
        if kind == GeneratorKind::Local && workers > 1 {
            log::warn!(
                "Local generator cannot be shared; running with 1 worker instead of {workers}"
            );
            workers = 1;
        }

        let mut evaluator = BatchEvaluator::new(generator)
            .temperature(evaluation.temperature)
            .extractor(AnswerExtractor::new(&self.config.prompt.answer_tag));

        let mut report = ExperimentReport {
            name: experiment.name.clone(),
            kind,
            modes: Vec::with_capacity(evaluation.modes.len()),
        };
        for &mode in &evaluation.modes {
            log::info!(
                "[{}] Running {mode} evaluation over {} samples with {workers} worker(s)",
                experiment.name,
                samples.len()
            );
            let template = self.config.prompt.clone();
            let prompt_builder: Arc<PromptBuilderFn> =
                Arc::new(move |question: &str| template.build(mode, question));

            let results = evaluator
                .batch_evaluate(
                    samples,
                    prompt_builder,
                    evaluation.max_tokens(mode),
                    workers,
                    mode.extracts_answer(),
                )
                .await;

            let mode_dir = experiment.output_dir.join(mode.as_str());
            let predictions_path = mode_dir.join("predictions.json");
            let metrics_path = mode_dir.join("metrics.json");

            let summary = calculate_all_metrics(&results);
            store::save_results(&predictions_path, &results)?;
            store::save_metrics(&metrics_path, &summary)?;
            log::info!("[{}] {mode} metrics:\n{summary}", experiment.name);

            report.modes.push(ModeReport {
                mode,
                summary,
                predictions_path,
                metrics_path,
            });
        }
        Ok(report)
    }
}
