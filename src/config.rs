use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::Deserialize;

use crate::http::mime::MimeRegistration;

#[derive(Clone, Debug, Deserialize)]
pub struct Config {
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,
    /// Root served by the static file transmitter
    #[serde(default)]
    pub public_folder: Option<PathBuf>,
    /// 0 = none, 1 = minimal web set, 2+ = full table
    #[serde(default)]
    pub mime_registry: MimeRegistration,
    #[serde(default)]
    pub mime_case_insensitive: bool,
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_listen_addr() -> String {
    "127.0.0.1:8080".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            listen_addr: default_listen_addr(),
            public_folder: None,
            mime_registry: MimeRegistration::default(),
            mime_case_insensitive: false,
            log_level: default_log_level(),
        }
    }
}

impl Config {
    /// Reads the configuration from environment variables.
    ///
    /// `LISTEN`, `PUBLIC_FOLDER`, `MIME_REGISTRY`, `MIME_CASE_INSENSITIVE`
    /// and `LOG_LEVEL`; unset or unparsable values keep their defaults.
    pub fn load() -> Self {
        let defaults = Self::default();

        let listen_addr =
            std::env::var("LISTEN")
                .unwrap_or(defaults.listen_addr);
        let public_folder = std::env::var_os("PUBLIC_FOLDER")
            .filter(|v| !v.is_empty())
            .map(PathBuf::from);
        let mime_registry = std::env::var("MIME_REGISTRY")
            .ok()
            .and_then(|v| v.trim().parse::<u64>().ok())
            .map(MimeRegistration::from_level)
            .unwrap_or(defaults.mime_registry);
        let mime_case_insensitive = std::env::var("MIME_CASE_INSENSITIVE")
            .map(|v| matches!(v.trim(), "1" | "true" | "yes"))
            .unwrap_or(false);
        let log_level =
            std::env::var("LOG_LEVEL")
                .unwrap_or(defaults.log_level);

        Self {
            listen_addr,
            public_folder,
            mime_registry,
            mime_case_insensitive,
            log_level,
        }
    }

    pub fn from_yaml_str(content: &str) -> anyhow::Result<Self> {
        serde_yaml::from_str(content).context("Invalid YAML configuration")
    }

    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        Self::from_yaml_str(&content)
    }
}
