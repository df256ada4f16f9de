//! Load the resource configuration from JSON text or a JSON file.

use crate::config::FullConfig;
use crate::error::ConfigError;
use std::path::Path;

pub fn from_json_str(json: &str) -> Result<FullConfig, ConfigError> {
    serde_json::from_str(json).map_err(|e| ConfigError::Load(e.to_string()))
}

pub async fn load_from_path(path: impl AsRef<Path>) -> Result<FullConfig, ConfigError> {
    let path = path.as_ref();
    tracing::debug!(path = %path.display(), "loading resource config");
    let text = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| ConfigError::Load(format!("{}: {}", path.display(), e)))?;
    from_json_str(&text)
}
