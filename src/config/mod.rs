pub use cw_core::config::*;

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

/// Load configuration from a TOML file
pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {:?}", path))?;

    let mut config: Config = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {:?}", path))?;

    expand_paths(&mut config);
    validate_config(&config)?;

    Ok(config)
}

/// Load config from default locations or return default config
pub fn load_config_or_default(custom_path: Option<&Path>) -> Result<Config> {
    if let Some(path) = custom_path {
        return load_config(path);
    }

    // Try default locations
    let default_paths = [
        "./cartwright.toml",
        "~/.config/cartwright/config.toml",
        "/etc/cartwright/config.toml",
    ];

    for path_str in default_paths {
        let path = shellexpand::tilde(path_str);
        let path = Path::new(path.as_ref());
        if path.exists() {
            return load_config(path);
        }
    }

    Ok(Config::default())
}

/// Expand `~` in the configured directories.
fn expand_paths(config: &mut Config) {
    let expand = |p: &mut PathBuf| {
        let expanded = shellexpand::tilde(&p.to_string_lossy()).into_owned();
        *p = PathBuf::from(expanded);
    };

    expand(&mut config.audio.root);
    expand(&mut config.audio.temp_dir);
    expand(&mut config.audio.import_dir);
    if let Some(ffmpeg) = config.tools.ffmpeg_path.as_mut() {
        expand(ffmpeg);
    }
}

/// Validate configuration
fn validate_config(config: &Config) -> Result<()> {
    if config.inventory.base_url.is_empty() {
        anyhow::bail!("inventory.base_url must be set");
    }
    if !config.inventory.base_url.starts_with("http://")
        && !config.inventory.base_url.starts_with("https://")
    {
        anyhow::bail!(
            "inventory.base_url {:?} is not an http(s) URL",
            config.inventory.base_url
        );
    }
    if config.inventory.client_id.is_empty() {
        anyhow::bail!("inventory.client_id must be set");
    }

    for warning in config.validate() {
        tracing::warn!("{}", warning);
    }

    if !config.audio.root.exists() {
        tracing::warn!("Audio root does not exist: {:?}", config.audio.root);
    }
    if !config.audio.import_dir.exists() {
        tracing::warn!("Import directory does not exist: {:?}", config.audio.import_dir);
    }

    Ok(())
}
