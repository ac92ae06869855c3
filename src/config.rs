//! Server configuration
//!
//! Configuration is read from an optional YAML file (named by `LANTERN_CONFIG`)
//! and then overridden by the `LISTEN` and `DOC_ROOT` environment variables.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::PathBuf;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub static_files: StaticFilesConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address the listener binds to, in `host:port` form
    pub listen_addr: String,
}

/// Where files are served from.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StaticFilesConfig {
    /// Directory beneath which every servable file must live
    pub doc_root: PathBuf,
    /// Document appended to targets ending in `/`
    pub index_file: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: "127.0.0.1:8080".to_string(),
        }
    }
}

impl Default for StaticFilesConfig {
    fn default() -> Self {
        Self {
            doc_root: PathBuf::from("./docroot"),
            index_file: "index.html".to_string(),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let mut cfg = match std::env::var("LANTERN_CONFIG") {
            Ok(path) => {
                let raw = std::fs::read_to_string(&path)
                    .with_context(|| format!("Failed to read config file {}", path))?;
                Self::from_yaml(&raw)
                    .with_context(|| format!("Failed to parse config file {}", path))?
            }
            Err(_) => Self::default(),
        };

        if let Ok(listen_addr) = std::env::var("LISTEN") {
            cfg.server.listen_addr = listen_addr;
        }
        if let Ok(doc_root) = std::env::var("DOC_ROOT") {
            cfg.static_files.doc_root = PathBuf::from(doc_root);
        }

        Ok(cfg)
    }

    pub fn from_yaml(raw: &str) -> Result<Self> {
        let cfg = serde_yaml::from_str(raw)?;
        Ok(cfg)
    }
}
