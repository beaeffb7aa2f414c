use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

use crate::fetch::request::DEFAULT_PATH_TEMPLATE;
use crate::fetch::{RequestConfig, DEFAULT_TIMEOUT};

pub mod loader;
pub mod validator;

pub use loader::load_config;
pub use validator::validate_config;

pub const DEFAULT_BASE_URL: &str = "http://localhost:61363";
pub const DEFAULT_DATASET_PATH: &str = "assets/data/StockPrices_Small.csv";
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Which price source a search runs against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    Local,
    Remote,
    Mock,
}

impl SourceKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            SourceKind::Local => "local",
            SourceKind::Remote => "remote",
            SourceKind::Mock => "mock",
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteConfig {
    pub request: RequestConfig,
    pub request_timeout: Duration,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            request: RequestConfig {
                base_url: DEFAULT_BASE_URL.to_string(),
                path_template: DEFAULT_PATH_TEMPLATE.to_string(),
                headers: HashMap::from([("Accept".to_string(), "application/json".to_string())]),
            },
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }
}

/// Resolved application settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub source: SourceKind,
    pub timeout: Duration,
    pub concurrency_limit: Option<usize>,
    pub dataset_path: PathBuf,
    pub remote: RemoteConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            source: SourceKind::Local,
            timeout: DEFAULT_TIMEOUT,
            concurrency_limit: None,
            dataset_path: PathBuf::from(DEFAULT_DATASET_PATH),
            remote: RemoteConfig::default(),
        }
    }
}
