use env_logger::{Builder, Env};

use llm_eval::config::LoggingConfig;

/// Installs `env_logger`; `RUST_LOG` overrides the configured level.
pub fn init_logging(config: &LoggingConfig) -> anyhow::Result<()> {
    Builder::from_env(Env::default().default_filter_or(config.level.as_str()))
        .format_timestamp_secs()
        .try_init()?;
    Ok(())
}
