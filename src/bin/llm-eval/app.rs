use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::Parser;

use llm_eval::config::load_config;
use llm_eval::{calculate_all_metrics, store, Runner};

use crate::args::{CliArgs, Command};
use crate::logging::init_logging;

pub async fn run() -> anyhow::Result<()> {
    let args = CliArgs::parse();
    let loaded = load_config(args.config.as_deref())?;
    init_logging(&loaded.config.logging)?;
    if !loaded.config_exists {
        log::info!("No configuration file found, using defaults");
    }

    match &args.command {
        Some(Command::Metrics { predictions, output }) => {
            rescore(predictions, output.as_deref())
        }
        None => {
            let mut config = loaded.config;
            args.apply(&mut config)?;
            evaluate(Runner::new(config)).await
        }
    }
}

async fn evaluate(runner: Runner) -> anyhow::Result<()> {
    let report = runner.run().await.with_context(|| {
        format!(
            "evaluation of {} failed",
            runner.config().evaluation.eval_file.display()
        )
    })?;

    for experiment in &report.experiments {
        for mode in &experiment.modes {
            println!("== {} / {} ==", experiment.name, mode.mode);
            println!("{}", mode.summary);
            println!("predictions: {}", mode.predictions_path.display());
            println!("metrics:     {}\n", mode.metrics_path.display());
        }
    }
    if let Some(table) = report.comparison() {
        println!("{table}");
    }
    Ok(())
}

fn rescore(predictions: &Path, output: Option<&Path>) -> anyhow::Result<()> {
    let results = store::load_results(predictions)
        .with_context(|| format!("cannot load {}", predictions.display()))?;
    let summary = calculate_all_metrics(&results);
    let output = output
        .map(Path::to_path_buf)
        .unwrap_or_else(|| sibling_metrics_path(predictions));
    store::save_metrics(&output, &summary)?;
    println!("{summary}");
    println!("metrics: {}", output.display());
    Ok(())
}

fn sibling_metrics_path(predictions: &Path) -> PathBuf {
    predictions.with_file_name("metrics.json")
}
