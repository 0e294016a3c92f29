//! TOML configuration for evaluation runs.

#[path = "config/types.rs"]
mod types;

#[path = "config/paths.rs"]
mod paths;

#[path = "config/load.rs"]
mod load;

pub use load::{load_config, LoadedConfig};
pub use paths::default_config_file;
pub use types::{
    AppConfig, EvaluationConfig, ExperimentConfig, GeneratorConfig, LocalConfig, LoggingConfig,
    RemoteConfig,
};
