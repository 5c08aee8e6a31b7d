use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Persisted application settings. An explicitly constructed value passed by
/// the caller; load/save are plain functions, not an ambient singleton.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AppConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_ai_provider")]
    pub default_ai: String,
    #[serde(default)]
    pub api_keys: BTreeMap<String, String>,
    #[serde(default)]
    pub models: BTreeMap<String, String>,
    #[serde(default)]
    pub last_paths: LastPaths,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct LastPaths {
    #[serde(default)]
    pub source: String,
    #[serde(default)]
    pub target: String,
}

fn default_ai_provider() -> String {
    "openai".to_string()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            default_ai: default_ai_provider(),
            api_keys: BTreeMap::new(),
            models: BTreeMap::new(),
            last_paths: LastPaths::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathKind {
    Source,
    Target,
}

impl AppConfig {
    pub fn api_key(&self, provider: &str) -> Option<&str> {
        self.api_keys.get(provider).map(String::as_str)
    }

    pub fn set_api_key(&mut self, provider: impl Into<String>, key: impl Into<String>) {
        self.api_keys.insert(provider.into(), key.into());
    }

    pub fn last_path(&self, kind: PathKind) -> Option<&str> {
        let value = match kind {
            PathKind::Source => self.last_paths.source.as_str(),
            PathKind::Target => self.last_paths.target.as_str(),
        };
        (!value.is_empty()).then_some(value)
    }

    pub fn set_last_path(&mut self, kind: PathKind, path: impl Into<String>) {
        match kind {
            PathKind::Source => self.last_paths.source = path.into(),
            PathKind::Target => self.last_paths.target = path.into(),
        }
    }
}

/// Missing or unreadable config yields the defaults silently; startup never
/// fails on a bad settings file.
pub fn load_config(path: &Path) -> AppConfig {
    match fs::read_to_string(path) {
        Ok(data) => match serde_json::from_str(&data) {
            Ok(config) => config,
            Err(err) => {
                debug!("config {} unparseable ({err}); using defaults", path.display());
                AppConfig::default()
            }
        },
        Err(err) => {
            debug!("config {} unreadable ({err}); using defaults", path.display());
            AppConfig::default()
        }
    }
}

pub fn save_config(config: &AppConfig, path: &Path) -> Result<()> {
    let payload = serde_json::to_string_pretty(config).context("failed to serialize config")?;
    fs::write(path, payload)
        .with_context(|| format!("failed to write config to {}", path.display()))?;
    Ok(())
}
