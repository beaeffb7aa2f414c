use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::error::{Context, Result};

use super::{validator, AppConfig, SourceKind};

/// Load settings from a JSON file. Relative dataset paths resolve against the file's
/// directory; anything left out keeps its default.
pub fn load_config(path: &Path) -> Result<AppConfig> {
    let json = fs::read_to_string(path)
        .with_context(|| format!("failed to read config JSON at {}", path.display()))?;

    let base_dir = path.parent().unwrap_or_else(|| Path::new("."));
    let config = parse_config(&json, base_dir)
        .with_context(|| format!("failed to parse config JSON at {}", path.display()))?;

    validator::validate_config(&config)?;

    Ok(config)
}

fn parse_config(json: &str, base_dir: &Path) -> std::result::Result<AppConfig, serde_json::Error> {
    let raw: RawConfig = serde_json::from_str(json)?;
    Ok(raw.into_config(base_dir))
}

#[derive(Debug, Default, Deserialize)]
struct RawConfig {
    #[serde(default)]
    source: Option<SourceKind>,
    #[serde(default)]
    timeout_ms: Option<u64>,
    #[serde(default)]
    concurrency_limit: Option<usize>,
    #[serde(default)]
    dataset: Option<RawDataset>,
    #[serde(default)]
    remote: Option<RawRemote>,
}

#[derive(Debug, Default, Deserialize)]
struct RawDataset {
    #[serde(default)]
    path: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct RawRemote {
    #[serde(default)]
    base_url: Option<String>,
    #[serde(default)]
    path_template: Option<String>,
    #[serde(default)]
    headers: Option<HashMap<String, String>>,
    #[serde(default)]
    request_timeout_ms: Option<u64>,
}

impl RawConfig {
    fn into_config(self, base_dir: &Path) -> AppConfig {
        let mut config = AppConfig::default();

        if let Some(source) = self.source {
            config.source = source;
        }
        if let Some(timeout_ms) = self.timeout_ms {
            config.timeout = Duration::from_millis(timeout_ms);
        }
        config.concurrency_limit = self.concurrency_limit;

        if let Some(path) = self.dataset.and_then(|dataset| dataset.path) {
            config.dataset_path = resolve_path(base_dir, &path);
        }

        if let Some(remote) = self.remote {
            if let Some(base_url) = remote.base_url {
                config.remote.request.base_url = base_url.trim().to_string();
            }
            if let Some(path_template) = remote.path_template {
                config.remote.request.path_template = path_template.trim().to_string();
            }
            if let Some(headers) = remote.headers {
                config.remote.request.headers = headers;
            }
            if let Some(timeout_ms) = remote.request_timeout_ms {
                config.remote.request_timeout = Duration::from_millis(timeout_ms);
            }
        }

        config
    }
}

fn resolve_path(base_dir: &Path, value: &str) -> PathBuf {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return PathBuf::new();
    }
    let path = PathBuf::from(trimmed);
    if path.is_absolute() {
        path
    } else {
        base_dir.join(path)
    }
}
