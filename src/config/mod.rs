//! Configuration management for Mavis
//!
//! Values are layered: environment variables override the TOML file,
//! which overrides built-in defaults.

pub mod file;

use std::path::PathBuf;
use std::time::Duration;

use crate::completion::CORRECTOR_TIMEOUT;
use crate::discovery::SERVICE_TYPE;
use crate::files::FileLocations;

/// Mavis configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// User-visible directory (phrases, pronunciations, soundbites)
    pub documents_dir: PathBuf,

    /// Private directory (audit log, history)
    pub data_dir: PathBuf,

    /// Corrector service configuration
    pub corrector: CorrectorConfig,

    /// Speech configuration
    pub speech: SpeechConfig,
}

/// Corrector service configuration
#[derive(Debug, Clone)]
pub struct CorrectorConfig {
    /// Use the corrector instead of local phrase ranking
    pub enabled: bool,

    /// Fixed `host:port`; mDNS discovery is used when `None`
    pub address: Option<String>,

    /// Request timeout
    pub timeout: Duration,

    /// mDNS service type
    pub service_type: String,
}

impl Default for CorrectorConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            address: None,
            timeout: CORRECTOR_TIMEOUT,
            service_type: SERVICE_TYPE.to_string(),
        }
    }
}

/// Speech configuration
#[derive(Debug, Clone)]
pub struct SpeechConfig {
    /// Play matching soundbites instead of synthesizing
    pub enable_soundbites: bool,

    /// Append spoken text and completions to the audit log
    pub log_chat_history: bool,
}

impl Default for SpeechConfig {
    fn default() -> Self {
        Self {
            enable_soundbites: true,
            log_chat_history: true,
        }
    }
}

impl Config {
    /// Load configuration from the environment and the standard config file
    #[must_use]
    pub fn load() -> Self {
        Self::from_file(file::load_config_file())
    }

    /// Build configuration from a parsed file, applying env overrides
    #[must_use]
    pub fn from_file(fc: file::MavisConfigFile) -> Self {
        let documents_dir = std::env::var("MAVIS_DOCUMENTS_DIR")
            .ok()
            .or(fc.documents_dir)
            .map_or_else(default_documents_dir, PathBuf::from);

        let data_dir = std::env::var("MAVIS_DATA_DIR")
            .ok()
            .or(fc.data_dir)
            .map_or_else(default_data_dir, PathBuf::from);

        let corrector = CorrectorConfig {
            enabled: env_flag("MAVIS_CORRECTOR_ENABLED")
                .or(fc.corrector.enabled)
                .unwrap_or(false),
            address: std::env::var("MAVIS_CORRECTOR_ADDR")
                .ok()
                .filter(|a| !a.is_empty())
                .or(fc.corrector.address),
            timeout: std::env::var("MAVIS_CORRECTOR_TIMEOUT_MS")
                .ok()
                .and_then(|s| s.parse().ok())
                .or(fc.corrector.timeout_ms)
                .map_or(CORRECTOR_TIMEOUT, Duration::from_millis),
            service_type: fc
                .corrector
                .service_type
                .unwrap_or_else(|| SERVICE_TYPE.to_string()),
        };

        let speech = SpeechConfig {
            enable_soundbites: env_flag("MAVIS_ENABLE_SOUNDBITES")
                .or(fc.speech.enable_soundbites)
                .unwrap_or(true),
            log_chat_history: env_flag("MAVIS_LOG_CHAT_HISTORY")
                .or(fc.speech.log_chat_history)
                .unwrap_or(true),
        };

        Self {
            documents_dir,
            data_dir,
            corrector,
            speech,
        }
    }

    /// Configuration rooted at explicit directories, everything else default
    #[must_use]
    pub fn with_dirs(documents_dir: PathBuf, data_dir: PathBuf) -> Self {
        Self {
            documents_dir,
            data_dir,
            corrector: CorrectorConfig::default(),
            speech: SpeechConfig::default(),
        }
    }

    /// Locations of the user files under the configured directories
    #[must_use]
    pub fn locations(&self) -> FileLocations {
        FileLocations::new(self.documents_dir.clone(), self.data_dir.clone())
    }
}

/// Parse a boolean env var ("1"/"true" or "0"/"false")
fn env_flag(name: &str) -> Option<bool> {
    std::env::var(name).ok().and_then(|v| {
        if v == "1" || v.eq_ignore_ascii_case("true") {
            Some(true)
        } else if v == "0" || v.eq_ignore_ascii_case("false") {
            Some(false)
        } else {
            None
        }
    })
}

/// Default documents directory: `~/Documents/Mavis`
fn default_documents_dir() -> PathBuf {
    directories::UserDirs::new()
        .and_then(|d| d.document_dir().map(|p| p.join("Mavis")))
        .unwrap_or_else(|| PathBuf::from("Mavis"))
}

/// Default data directory: `~/.local/share/mavis` on Linux
fn default_data_dir() -> PathBuf {
    directories::BaseDirs::new()
        .map_or_else(|| PathBuf::from(".mavis"), |d| d.data_dir().join("mavis"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_with_dirs_defaults() {
        let config = Config::with_dirs(PathBuf::from("/docs"), PathBuf::from("/data"));
        assert!(!config.corrector.enabled);
        assert_eq!(config.corrector.timeout, Duration::from_millis(1500));
        assert!(config.speech.enable_soundbites);
        assert!(config.speech.log_chat_history);
        assert_eq!(
            config.locations().path(crate::files::UserFile::History),
            PathBuf::from("/data/history.json")
        );
    }

    #[test]
    fn test_file_values_apply() {
        let fc: file::MavisConfigFile = toml::from_str(
            r#"
            documents_dir = "/srv/mavis/docs"
            [corrector]
            timeout_ms = 800
            service_type = "_fixer._tcp.local."
            "#,
        )
        .unwrap();
        let config = Config::from_file(fc);
        assert_eq!(config.corrector.service_type, "_fixer._tcp.local.");
        if std::env::var("MAVIS_CORRECTOR_TIMEOUT_MS").is_err() {
            assert_eq!(config.corrector.timeout, Duration::from_millis(800));
        }
        if std::env::var("MAVIS_DOCUMENTS_DIR").is_err() {
            assert_eq!(config.documents_dir, PathBuf::from("/srv/mavis/docs"));
        }
    }
}
