use crate::{
    backends::{LocalCommand, OpenAICompatible},
    config::GeneratorConfig,
    error::EvalError,
    resilient::{ResilienceConfig, Resilient},
};

use super::handle::{Generator, GeneratorKind};

impl Generator {
    /// Builds the configured generator variant.
    ///
    /// Remote clients are always wrapped in [`Resilient`]; the local program
    /// is driven as is.
    pub fn from_config(
        config: &GeneratorConfig,
        resilience: &ResilienceConfig,
    ) -> Result<Self, EvalError> {
        match config.kind {
            GeneratorKind::Remote => {
                let remote = &config.remote;
                let client = OpenAICompatible::new(
                    remote.resolve_api_key()?,
                    &remote.base_url,
                    &remote.model,
                    remote.timeout_seconds,
                )?;
                log::info!(
                    "Using remote generator {} at {}",
                    client.model(),
                    client.base_url()
                );
                Ok(Generator::remote(Resilient::new(client, resilience.clone())))
            }
            GeneratorKind::Local => {
                let command = LocalCommand::new(config.local.command_config()?)?;
                log::info!(
                    "Using local generator {}",
                    config.local.program.display()
                );
                Ok(Generator::local(command))
            }
        }
    }
}
