use std::fs;
use std::path::{Path, PathBuf};

use crate::error::EvalError;

use super::paths::default_config_file;
use super::types::AppConfig;

#[derive(Debug)]
pub struct LoadedConfig {
    pub config: AppConfig,
    /// File the configuration was looked up in, if any.
    pub path: Option<PathBuf>,
    pub config_exists: bool,
}

/// Loads the configuration from `path_override` or the default location.
///
/// A missing file yields the defaults; an unreadable or invalid one is an
/// error.
pub fn load_config(path_override: Option<&Path>) -> Result<LoadedConfig, EvalError> {
    let path = path_override.map(Path::to_path_buf).or_else(default_config_file);
    let Some(path) = path else {
        log::debug!("No home directory, using default configuration");
        return Ok(LoadedConfig {
            config: AppConfig::default(),
            path: None,
            config_exists: false,
        });
    };

    match fs::read_to_string(&path) {
        Ok(contents) => {
            let config = AppConfig::from_toml_str(&contents).map_err(|err| match err {
                EvalError::Config(msg) => {
                    EvalError::Config(format!("{}: {msg}", path.display()))
                }
                other => other,
            })?;
            log::debug!("Loaded configuration from {}", path.display());
            Ok(LoadedConfig {
                config,
                path: Some(path),
                config_exists: true,
            })
        }
        Err(err) if err.kind() == std::io::ErrorKind::NotFound && path_override.is_none() => {
            log::debug!("{} not found, using default configuration", path.display());
            Ok(LoadedConfig {
                config: AppConfig::default(),
                path: Some(path),
                config_exists: false,
            })
        }
        Err(err) => Err(EvalError::Config(format!(
            "cannot read {}: {err}",
            path.display()
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generator::GeneratorKind;

    #[test]
    fn test_load_from_explicit_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("eval.toml");
        fs::write(
            &path,
            "[generator]\nkind = \"local\"\n\n[evaluation]\nworkers = 4\n",
        )
        .unwrap();

        let loaded = load_config(Some(&path)).unwrap();
        assert!(loaded.config_exists);
        assert_eq!(loaded.path.as_deref(), Some(path.as_path()));
        assert_eq!(loaded.config.generator.kind, GeneratorKind::Local);
        assert_eq!(loaded.config.evaluation.workers, 4);
    }

    #[test]
    fn test_explicit_missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_config(Some(&dir.path().join("absent.toml"))).unwrap_err();
        assert!(matches!(err, EvalError::Config(_)));
    }

    #[test]
    fn test_parse_error_names_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.toml");
        fs::write(&path, "[evaluation\nworkers = ").unwrap();

        let err = load_config(Some(&path)).unwrap_err();
        assert!(err.to_string().contains("broken.toml"));
    }
}
