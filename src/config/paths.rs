use std::path::PathBuf;

/// `~/.config/llm-eval/config.toml`, or `None` without a home directory.
pub fn default_config_file() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".config").join("llm-eval").join("config.toml"))
}
