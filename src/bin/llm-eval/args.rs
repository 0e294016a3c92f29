use std::path::PathBuf;

use anyhow::bail;
use clap::{Parser, Subcommand};

use llm_eval::config::AppConfig;
use llm_eval::prompt::PromptMode;
use llm_eval::GeneratorKind;

#[derive(Parser, Debug)]
#[command(
    name = "llm-eval",
    about = "Evaluate a local or API-hosted model with zero-shot and chain-of-thought prompts"
)]
pub struct CliArgs {
    #[command(subcommand)]
    pub command: Option<Command>,
    /// Configuration file (defaults to ~/.config/llm-eval/config.toml)
    #[arg(long, short = 'c', global = true)]
    pub config: Option<PathBuf>,
    /// Evaluation samples, JSON array or JSON Lines
    #[arg(long)]
    pub eval_file: Option<PathBuf>,
    #[arg(long, short = 'o')]
    pub output_dir: Option<PathBuf>,
    /// Concurrent requests; local generators always use 1
    #[arg(long, short = 'w')]
    pub workers: Option<usize>,
    /// Kind of the `[generator]` section: `remote` (alias `api`) or `local`
    #[arg(long, short = 'g')]
    pub generator: Option<GeneratorKind>,
    #[arg(long)]
    pub skip_zero_shot: bool,
    #[arg(long)]
    pub skip_cot: bool,
    /// Skip experiments backed by a remote API
    #[arg(long)]
    pub skip_remote: bool,
    /// Skip experiments backed by a local model
    #[arg(long)]
    pub skip_local: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Recompute metrics from an existing predictions file
    Metrics {
        predictions: PathBuf,
        /// Where to write the metrics (defaults to metrics.json next to the predictions)
        #[arg(long, short = 'o')]
        output: Option<PathBuf>,
    },
}

impl CliArgs {
    /// Applies command-line overrides on top of the loaded configuration.
    pub fn apply(&self, config: &mut AppConfig) -> anyhow::Result<()> {
        let evaluation = &mut config.evaluation;
        if let Some(eval_file) = &self.eval_file {
            evaluation.eval_file = eval_file.clone();
        }
        if let Some(output_dir) = &self.output_dir {
            evaluation.output_dir = output_dir.clone();
        }
        if let Some(workers) = self.workers {
            evaluation.workers = workers;
        }
        if let Some(kind) = self.generator {
            config.generator.kind = kind;
        }

        config.evaluation.modes.retain(|mode| match mode {
            PromptMode::ZeroShot => !self.skip_zero_shot,
            PromptMode::Cot => !self.skip_cot,
        });
        if config.evaluation.modes.is_empty() {
            bail!("nothing to run: every prompt mode was skipped");
        }

        let keep = |kind: GeneratorKind| match kind {
            GeneratorKind::Remote => !self.skip_remote,
            GeneratorKind::Local => !self.skip_local,
        };
        if config.experiments.is_empty() {
            if !keep(config.generator.kind) {
                bail!("nothing to run: the {} generator was skipped", config.generator.kind);
            }
        } else {
            config.experiments.retain(|experiment| keep(experiment.generator.kind));
            if config.experiments.is_empty() {
                bail!("nothing to run: every experiment was skipped");
            }
        }
        Ok(())
    }
}
