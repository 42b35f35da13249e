//! TOML configuration file loading
//!
//! Supports `~/.config/mavis/config.toml` as a persistent config source.
//! All fields are optional; the file is a partial overlay on top of defaults.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::Result;

/// Top-level TOML configuration file schema
#[derive(Debug, Default, Deserialize)]
pub struct MavisConfigFile {
    /// Directory holding phrases, pronunciations and soundbites
    #[serde(default)]
    pub documents_dir: Option<String>,

    /// Directory holding the audit log and message history
    #[serde(default)]
    pub data_dir: Option<String>,

    /// Corrector service configuration
    #[serde(default)]
    pub corrector: CorrectorFileConfig,

    /// Speech configuration
    #[serde(default)]
    pub speech: SpeechFileConfig,
}

/// Corrector service configuration
#[derive(Debug, Default, Deserialize)]
pub struct CorrectorFileConfig {
    /// Use the corrector instead of local phrase ranking
    pub enabled: Option<bool>,

    /// Fixed `host:port`; discovery is used when absent
    pub address: Option<String>,

    /// Request timeout in milliseconds
    pub timeout_ms: Option<u64>,

    /// mDNS service type to browse for
    pub service_type: Option<String>,
}

/// Speech configuration
#[derive(Debug, Default, Deserialize)]
pub struct SpeechFileConfig {
    /// Play matching soundbites instead of synthesizing
    pub enable_soundbites: Option<bool>,

    /// Append spoken text and completions to the audit log
    pub log_chat_history: Option<bool>,
}

/// Load the TOML config file from the standard path
///
/// Returns `MavisConfigFile::default()` if the file doesn't exist or can't be parsed.
pub fn load_config_file() -> MavisConfigFile {
    config_file_path().map_or_else(MavisConfigFile::default, |p| load_config_file_from(&p))
}

/// Load a TOML config file from `path`, falling back to defaults
pub fn load_config_file_from(path: &Path) -> MavisConfigFile {
    if !path.exists() {
        return MavisConfigFile::default();
    }

    match std::fs::read_to_string(path) {
        Ok(content) => match parse_config_file(&content) {
            Ok(config) => {
                tracing::info!(path = %path.display(), "loaded config file");
                config
            }
            Err(e) => {
                tracing::warn!(
                    path = %path.display(),
                    error = %e,
                    "failed to parse config file, using defaults"
                );
                MavisConfigFile::default()
            }
        },
        Err(e) => {
            tracing::warn!(
                path = %path.display(),
                error = %e,
                "failed to read config file"
            );
            MavisConfigFile::default()
        }
    }
}

/// Parse config file contents
///
/// # Errors
///
/// Returns [`crate::Error::Toml`] if the contents are not a valid config file
pub fn parse_config_file(content: &str) -> Result<MavisConfigFile> {
    Ok(toml::from_str(content)?)
}

/// Return the config file path: `~/.config/mavis/config.toml`
pub fn config_file_path() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|d| d.config_dir().join("mavis").join("config.toml"))
}
