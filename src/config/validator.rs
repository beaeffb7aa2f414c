use crate::error::{AppError, Result};

use super::{AppConfig, SourceKind};

/// Validate resolved settings and surface every problem in one error.
pub fn validate_config(config: &AppConfig) -> Result<()> {
    let mut issues = Vec::new();

    validate_limits(config, &mut issues);
    match config.source {
        SourceKind::Local => validate_dataset(config, &mut issues),
        SourceKind::Remote => validate_remote(config, &mut issues),
        SourceKind::Mock => {}
    }

    if issues.is_empty() {
        Ok(())
    } else {
        Err(AppError::message(format!(
            "configuration invalid:\n  - {}",
            issues.join("\n  - ")
        )))
    }
}

fn validate_limits(config: &AppConfig, issues: &mut Vec<String>) {
    if config.timeout.is_zero() {
        issues.push("timeout_ms must be greater than zero".to_string());
    }
    if config.concurrency_limit == Some(0) {
        issues.push("concurrency_limit must be at least 1".to_string());
    }
}

fn validate_dataset(config: &AppConfig, issues: &mut Vec<String>) {
    if config.dataset_path.as_os_str().is_empty() {
        issues.push("dataset.path must not be empty for the local source".to_string());
    }
}

fn validate_remote(config: &AppConfig, issues: &mut Vec<String>) {
    let request = &config.remote.request;
    let base_url = request.base_url.trim();
    if base_url.is_empty() {
        issues.push("remote.base_url must not be empty".to_string());
    } else if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
        issues.push(format!(
            "remote.base_url `{base_url}` must start with http:// or https://"
        ));
    }

    if !request.path_template.contains("{ticker}")
        && !request.path_template.contains("{ticker_lower}")
    {
        issues.push("remote.path_template must contain a `{ticker}` placeholder".to_string());
    }

    if config.remote.request_timeout.is_zero() {
        issues.push("remote.request_timeout_ms must be greater than zero".to_string());
    }
}
