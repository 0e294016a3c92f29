//! Local inference through a llama.cpp style command-line program.
//!
//! The program loads a base model and merges a fine-tuning adapter on every
//! call; the accelerator it runs on is treated as an exclusive resource.

use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;

use crate::{
    error::EvalError,
    generator::{ExclusiveGenerator, GenerationRequest},
};

const TOP_P: f32 = 0.9;
const REPEAT_PENALTY: f32 = 1.1;

/// Configuration for the local inference program.
#[derive(Debug, Clone)]
pub struct LocalCommandConfig {
    /// Inference executable, e.g. `llama-cli`.
    pub program: PathBuf,
    /// Base model weights.
    pub base_model: PathBuf,
    /// Adapter (LoRA) weights merged over the base model.
    pub adapter: Option<PathBuf>,
    /// Additional arguments appended before the prompt.
    pub extra_args: Vec<String>,
    /// Upper bound for one generation, in seconds.
    pub timeout_seconds: Option<u64>,
}

/// Generator that shells out to a local inference program.
#[derive(Debug)]
pub struct LocalCommand {
    config: LocalCommandConfig,
    generations: u64,
}

impl LocalCommand {
    pub fn new(config: LocalCommandConfig) -> Result<Self, EvalError> {
        if !config.base_model.exists() {
            return Err(EvalError::Config(format!(
                "base model not found: {}",
                config.base_model.display()
            )));
        }
        if let Some(adapter) = config.adapter.as_ref().filter(|path| !path.exists()) {
            return Err(EvalError::Config(format!(
                "adapter not found: {}",
                adapter.display()
            )));
        }
        Ok(Self {
            config,
            generations: 0,
        })
    }

    /// Number of completed generations.
    pub fn generations(&self) -> u64 {
        self.generations
    }

    fn args(&self, request: &GenerationRequest) -> Vec<String> {
        let mut args = vec![
            "--model".to_string(),
            self.config.base_model.display().to_string(),
        ];
        if let Some(adapter) = &self.config.adapter {
            args.push("--lora".to_string());
            args.push(adapter.display().to_string());
        }
        args.extend([
            "--n-predict".to_string(),
            request.max_tokens.to_string(),
            "--temp".to_string(),
            request.temperature.to_string(),
            "--top-p".to_string(),
            TOP_P.to_string(),
            "--repeat-penalty".to_string(),
            REPEAT_PENALTY.to_string(),
            "--no-display-prompt".to_string(),
        ]);
        args.extend(self.config.extra_args.iter().cloned());
        args.push("--prompt".to_string());
        args.push(request.prompt.clone());
        args
    }
}

#[async_trait]
impl ExclusiveGenerator for LocalCommand {
    async fn generate(&mut self, request: &GenerationRequest) -> Result<String, EvalError> {
        let mut command = Command::new(&self.config.program);
        command
            .args(self.args(request))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        log::trace!("Running local generator: {:?}", command.as_std());

        let child = command.spawn().map_err(|e| {
            EvalError::LocalProcess(format!(
                "failed to start {}: {e}",
                self.config.program.display()
            ))
        })?;

        let output = match self.config.timeout_seconds {
            Some(seconds) => {
                tokio::time::timeout(Duration::from_secs(seconds), child.wait_with_output())
                    .await
                    .map_err(|_| EvalError::Timeout { seconds })?
            }
            None => child.wait_with_output().await,
        }
        .map_err(|e| EvalError::LocalProcess(e.to_string()))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(EvalError::LocalProcess(format!(
                "{} exited with {}: {}",
                self.config.program.display(),
                output.status,
                stderr.trim()
            )));
        }

        self.generations += 1;
        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }
}
