use std::collections::HashSet;
use std::path::{Component, Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::backends::LocalCommandConfig;
use crate::error::EvalError;
use crate::evaluator::DEFAULT_TEMPERATURE;
use crate::generator::GeneratorKind;
use crate::prompt::{PromptMode, PromptTemplate};
use crate::resilient::ResilienceConfig;

const DEFAULT_BASE_URL: &str = "https://dashscope.aliyuncs.com/compatible-mode/v1";
const DEFAULT_MODEL: &str = "qwen-plus";
const DEFAULT_API_KEY_ENV: &str = "DASHSCOPE_API_KEY";
const DEFAULT_REMOTE_TIMEOUT_SECONDS: u64 = 120;
const DEFAULT_LOCAL_PROGRAM: &str = "llama-cli";
const DEFAULT_LOCAL_TIMEOUT_SECONDS: u64 = 600;
const DEFAULT_ZERO_SHOT_MAX_TOKENS: u32 = 2048;
const DEFAULT_COT_MAX_TOKENS: u32 = 4096;

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct AppConfig {
    pub generator: GeneratorConfig,
    /// Named generator setups evaluated in one run. When empty, `generator`
    /// is evaluated alone.
    pub experiments: Vec<ExperimentConfig>,
    pub resilience: ResilienceConfig,
    pub evaluation: EvaluationConfig,
    pub prompt: PromptTemplate,
    pub logging: LoggingConfig,
}

impl AppConfig {
    pub fn from_toml_str(contents: &str) -> Result<Self, EvalError> {
        let config: AppConfig = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Rejects settings no run could succeed with.
    pub fn validate(&self) -> Result<(), EvalError> {
        if self.resilience.max_attempts == 0 {
            return Err(EvalError::Config(
                "resilience.max_attempts must be at least 1".to_string(),
            ));
        }
        if self.evaluation.modes.is_empty() {
            return Err(EvalError::Config(
                "evaluation.modes must name at least one mode".to_string(),
            ));
        }
        if self.prompt.answer_tag.trim().is_empty() {
            return Err(EvalError::Config("prompt.answer_tag is empty".to_string()));
        }
        let mut names = HashSet::new();
        for experiment in &self.experiments {
            if !is_plain_dir_name(&experiment.name) {
                return Err(EvalError::Config(format!(
                    "experiment name {:?} must be a single directory name",
                    experiment.name
                )));
            }
            if !names.insert(experiment.name.as_str()) {
                return Err(EvalError::Config(format!(
                    "duplicate experiment name {:?}",
                    experiment.name
                )));
            }
        }
        Ok(())
    }
}

fn is_plain_dir_name(name: &str) -> bool {
    let mut components = Path::new(name).components();
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    )
}

/// One named generator setup, written under `{output_dir}/{name}/`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ExperimentConfig {
    pub name: String,
    pub generator: GeneratorConfig,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct GeneratorConfig {
    pub kind: GeneratorKind,
    pub remote: RemoteConfig,
    pub local: LocalConfig,
}

/// An OpenAI-compatible chat completion service.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct RemoteConfig {
    pub base_url: String,
    pub model: String,
    /// Inline key; takes precedence over `api_key_env`.
    pub api_key: Option<String>,
    pub api_key_env: String,
    pub timeout_seconds: Option<u64>,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            api_key: None,
            api_key_env: DEFAULT_API_KEY_ENV.to_string(),
            timeout_seconds: Some(DEFAULT_REMOTE_TIMEOUT_SECONDS),
        }
    }
}

impl RemoteConfig {
    pub fn resolve_api_key(&self) -> Result<String, EvalError> {
        if let Some(key) = self.api_key.as_ref().filter(|key| !key.is_empty()) {
            return Ok(key.clone());
        }
        std::env::var(&self.api_key_env)
            .ok()
            .filter(|key| !key.is_empty())
            .ok_or_else(|| {
                EvalError::Config(format!(
                    "no API key: set generator.remote.api_key or the {} environment variable",
                    self.api_key_env
                ))
            })
    }
}

/// A local inference program loading a base model plus adapter.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct LocalConfig {
    pub program: PathBuf,
    pub base_model: Option<PathBuf>,
    pub adapter: Option<PathBuf>,
    pub extra_args: Vec<String>,
    pub timeout_seconds: Option<u64>,
}

impl Default for LocalConfig {
    fn default() -> Self {
        Self {
            program: PathBuf::from(DEFAULT_LOCAL_PROGRAM),
            base_model: None,
            adapter: None,
            extra_args: Vec::new(),
            timeout_seconds: Some(DEFAULT_LOCAL_TIMEOUT_SECONDS),
        }
    }
}

impl LocalConfig {
    pub fn command_config(&self) -> Result<LocalCommandConfig, EvalError> {
        let base_model = self.base_model.clone().ok_or_else(|| {
            EvalError::Config("generator.local.base_model is required".to_string())
        })?;
        Ok(LocalCommandConfig {
            program: self.program.clone(),
            base_model,
            adapter: self.adapter.clone(),
            extra_args: self.extra_args.clone(),
            timeout_seconds: self.timeout_seconds,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct EvaluationConfig {
    pub eval_file: PathBuf,
    pub output_dir: PathBuf,
    pub workers: usize,
    pub temperature: f32,
    pub zero_shot_max_tokens: u32,
    pub cot_max_tokens: u32,
    /// Modes to run, in order.
    pub modes: Vec<PromptMode>,
}

impl Default for EvaluationConfig {
    fn default() -> Self {
        Self {
            eval_file: PathBuf::from("data/eval.json"),
            output_dir: PathBuf::from("results"),
            workers: 1,
            temperature: DEFAULT_TEMPERATURE,
            zero_shot_max_tokens: DEFAULT_ZERO_SHOT_MAX_TOKENS,
            cot_max_tokens: DEFAULT_COT_MAX_TOKENS,
            modes: vec![PromptMode::ZeroShot, PromptMode::Cot],
        }
    }
}

impl EvaluationConfig {
    pub fn max_tokens(&self, mode: PromptMode) -> u32 {
        match mode {
            PromptMode::ZeroShot => self.zero_shot_max_tokens,
            PromptMode::Cot => self.cot_max_tokens,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_document_gives_defaults() {
        let config = AppConfig::from_toml_str("").unwrap();
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.generator.kind, GeneratorKind::Remote);
        assert_eq!(config.evaluation.workers, 1);
        assert_eq!(config.evaluation.max_tokens(PromptMode::ZeroShot), 2048);
        assert_eq!(config.evaluation.max_tokens(PromptMode::Cot), 4096);
        assert_eq!(config.resilience.max_attempts, 3);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_partial_sections_keep_other_defaults() {
        let config = AppConfig::from_toml_str(
            r#"
            [generator]
            kind = "local"

            [generator.local]
            base_model = "/models/base.gguf"
            adapter = "/models/lora.gguf"
            extra_args = ["--threads", "8"]

            [evaluation]
            workers = 10
            modes = ["cot"]

            [resilience]
            max_attempts = 5

            [prompt]
            answer_tag = "final"
            "#,
        )
        .unwrap();

        assert_eq!(config.generator.kind, GeneratorKind::Local);
        assert_eq!(config.generator.local.program, PathBuf::from("llama-cli"));
        assert_eq!(config.evaluation.workers, 10);
        assert_eq!(config.evaluation.modes, vec![PromptMode::Cot]);
        assert_eq!(config.evaluation.temperature, DEFAULT_TEMPERATURE);
        assert_eq!(config.resilience.max_attempts, 5);
        assert_eq!(config.resilience.base_delay_ms, 1_000);
        assert_eq!(config.prompt.answer_tag, "final");
        assert_eq!(config.prompt.reasoning_tag, "reasoning");

        let command = config.generator.local.command_config().unwrap();
        assert_eq!(command.adapter, Some(PathBuf::from("/models/lora.gguf")));
        assert_eq!(command.extra_args, vec!["--threads", "8"]);
    }

    #[test]
    fn test_invalid_documents_are_config_errors() {
        let bad_kind = AppConfig::from_toml_str("[generator]\nkind = \"gpu\"\n");
        assert!(matches!(bad_kind, Err(EvalError::Config(_))));

        let no_modes = AppConfig::from_toml_str("[evaluation]\nmodes = []\n");
        assert!(matches!(no_modes, Err(EvalError::Config(_))));

        let no_attempts = AppConfig::from_toml_str("[resilience]\nmax_attempts = 0\n");
        assert!(matches!(no_attempts, Err(EvalError::Config(_))));
    }

    #[test]
    fn test_experiments_section() {
        let config = AppConfig::from_toml_str(
            r#"
            [[experiments]]
            name = "api_baseline"

            [experiments.generator.remote]
            model = "qwen-max"

            [[experiments]]
            name = "lora_finetuned"

            [experiments.generator]
            kind = "local"

            [experiments.generator.local]
            base_model = "/models/base.gguf"
            "#,
        )
        .unwrap();

        assert_eq!(config.experiments.len(), 2);
        let api = &config.experiments[0];
        assert_eq!(api.name, "api_baseline");
        assert_eq!(api.generator.kind, GeneratorKind::Remote);
        assert_eq!(api.generator.remote.model, "qwen-max");
        let lora = &config.experiments[1];
        assert_eq!(lora.generator.kind, GeneratorKind::Local);
        assert_eq!(
            lora.generator.local.base_model,
            Some(PathBuf::from("/models/base.gguf"))
        );
    }

    #[test]
    fn test_experiment_names_are_checked() {
        for bad in ["", "..", "a/b", "/abs"] {
            let doc = format!("[[experiments]]\nname = {bad:?}\n");
            assert!(
                matches!(AppConfig::from_toml_str(&doc), Err(EvalError::Config(_))),
                "{bad:?} accepted"
            );
        }

        let duplicate = "[[experiments]]\nname = \"x\"\n\n[[experiments]]\nname = \"x\"\n";
        let err = AppConfig::from_toml_str(duplicate).unwrap_err();
        assert!(err.to_string().contains("duplicate experiment"));
    }

    #[test]
    fn test_local_requires_base_model() {
        let err = LocalConfig::default().command_config().unwrap_err();
        assert!(err.to_string().contains("base_model"));
    }

    #[test]
    fn test_inline_api_key_wins() {
        let remote = RemoteConfig {
            api_key: Some("sk-inline".to_string()),
            api_key_env: "LLM_EVAL_TEST_UNUSED_KEY".to_string(),
            ..RemoteConfig::default()
        };
        assert_eq!(remote.resolve_api_key().unwrap(), "sk-inline");
    }

    #[test]
    fn test_missing_api_key() {
        let remote = RemoteConfig {
            api_key_env: "LLM_EVAL_TEST_SURELY_UNSET_KEY".to_string(),
            ..RemoteConfig::default()
        };
        assert!(matches!(remote.resolve_api_key(), Err(EvalError::Config(_))));
    }
}
