//! Client configuration
//!
//! Defaults, then an optional YAML file, then CLI/env overrides.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{NominaError, NominaResult};

pub const DEFAULT_API_URL: &str = "http://localhost:8000/api/v1";

/// 10 MiB, the backend's upload ceiling.
pub const DEFAULT_MAX_UPLOAD_BYTES: u64 = 10 * 1024 * 1024;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Base URL including the version prefix, without trailing slash
    pub api_url: String,
    pub timeout_secs: u64,
    pub max_upload_bytes: u64,
    /// Lowercase, dot-prefixed
    pub allowed_extensions: Vec<String>,
    pub page_size: usize,
    /// Maximum page numbers exposed for navigation
    pub page_window: usize,
    /// Pause after a successful import before the workflow moves to `view`
    pub import_settle_ms: u64,
    /// `limit` sent with the single bulk employee fetch
    pub employee_fetch_limit: u32,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            timeout_secs: 30,
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            allowed_extensions: vec![".xlsx".to_string(), ".xls".to_string()],
            page_size: 10,
            page_window: 5,
            import_settle_ms: 2000,
            employee_fetch_limit: 1000,
        }
    }
}

impl ClientConfig {
    /// Load a YAML config file; keys that are absent keep their defaults.
    pub fn from_yaml_file<P: AsRef<Path>>(path: P) -> NominaResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            NominaError::Config(format!("Failed to read {}: {}", path.display(), e))
        })?;
        Self::from_yaml_str(&content)
    }

    pub fn from_yaml_str(content: &str) -> NominaResult<Self> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        let config: ClientConfig = serde_yaml::from_str(content)?;
        config.validated()
    }

    /// Builder-style override of the API base URL.
    pub fn with_api_url(mut self, url: impl Into<String>) -> Self {
        self.api_url = url.into();
        self
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn import_settle_delay(&self) -> Duration {
        Duration::from_millis(self.import_settle_ms)
    }

    /// Join an endpoint path onto the base URL.
    pub fn endpoint(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.api_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    /// Join a path onto the server root, dropping a trailing `/api/v<N>`
    /// version prefix from the base URL. Health checks live there.
    pub fn root_endpoint(&self, path: &str) -> String {
        let base = self.api_url.trim_end_matches('/');
        let root = match base.rsplit_once('/') {
            Some((head, version)) if is_version_segment(version) => head
                .strip_suffix("/api")
                .unwrap_or(head),
            _ => base,
        };
        format!("{}/{}", root, path.trim_start_matches('/'))
    }

    fn validated(mut self) -> NominaResult<Self> {
        if self.page_size == 0 {
            return Err(NominaError::Config("page_size must be at least 1".into()));
        }
        if self.page_window == 0 {
            return Err(NominaError::Config("page_window must be at least 1".into()));
        }
        if self.allowed_extensions.is_empty() {
            return Err(NominaError::Config(
                "allowed_extensions must not be empty".into(),
            ));
        }
        self.allowed_extensions = self
            .allowed_extensions
            .iter()
            .map(|ext| {
                let ext = ext.to_lowercase();
                if ext.starts_with('.') {
                    ext
                } else {
                    format!(".{ext}")
                }
            })
            .collect();
        Ok(self)
    }
}

fn is_version_segment(segment: &str) -> bool {
    segment
        .strip_prefix('v')
        .is_some_and(|n| !n.is_empty() && n.chars().all(|c| c.is_ascii_digit()))
}
