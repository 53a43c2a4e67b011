//! Project configuration for contract generation

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::catalog::{CoverageSet, LEGACY_COVERED_OPERATIONS};

pub const DEFAULT_SPEC: &str = "apiDocumentation.json";
pub const DEFAULT_BASE_URL: &str = "https://api.practicesoftwaretesting.com";
pub const DEFAULT_TIMEOUT_SECS: u64 = 45;

/// Config file names, in lookup order.
pub const CONFIG_CANDIDATES: [&str; 3] = [".contractgen.toml", ".contractgen.json", "contractgen.toml"];

/// Project configuration. Missing keys take their defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// OpenAPI document path (local file)
    pub spec: PathBuf,

    /// Base URL of the API under test
    pub base_url: String,

    /// HTTP headers sent with every request
    pub headers: BTreeMap<String, String>,

    /// Operation keys (`get /products`) already covered by hand-written tests
    pub covered_operations: Vec<String>,

    /// Per-request timeout in seconds
    pub timeout_secs: u64,

    /// Worker threads (rayon default when unset)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub jobs: Option<usize>,

    /// Lower bound on the number of documented operations
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_operations: Option<usize>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            spec: PathBuf::from(DEFAULT_SPEC),
            base_url: DEFAULT_BASE_URL.to_string(),
            headers: BTreeMap::from([("Accept".to_string(), "application/json".to_string())]),
            covered_operations: LEGACY_COVERED_OPERATIONS.iter().map(ToString::to_string).collect(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            jobs: None,
            min_operations: None,
        }
    }
}

impl Config {
    /// Load config from file
    ///
    /// # Errors
    ///
    /// Returns error if file cannot be read or parsed
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Io(path.to_path_buf(), e.to_string()))?;

        if path.extension().is_some_and(|ext| ext == "json") {
            serde_json::from_str(&content).map_err(|e| ConfigError::Parse(e.to_string()))
        } else {
            toml::from_str(&content).map_err(|e| ConfigError::Parse(e.to_string()))
        }
    }

    /// Load from the first existing candidate in the current directory.
    ///
    /// # Errors
    ///
    /// Returns error if a candidate exists but cannot be read or parsed
    pub fn load_default() -> Result<Self, ConfigError> {
        Self::load_from_dir(Path::new("."))
    }

    /// Load from the first existing candidate in `dir`, or defaults.
    ///
    /// # Errors
    ///
    /// Returns error if a candidate exists but cannot be read or parsed
    pub fn load_from_dir(dir: &Path) -> Result<Self, ConfigError> {
        for name in CONFIG_CANDIDATES {
            let path = dir.join(name);
            if path.exists() {
                tracing::debug!(path = %path.display(), "loading config");
                return Self::load(&path);
            }
        }

        tracing::debug!(dir = %dir.display(), "no config file, using defaults");
        Ok(Self::default())
    }

    /// The coverage set built from `covered_operations`.
    #[must_use]
    pub fn coverage(&self) -> CoverageSet {
        CoverageSet::new(self.covered_operations.iter().cloned())
    }

    /// Starter config written by `contractgen init`
    #[must_use]
    pub const fn example() -> &'static str {
        r#"# contractgen configuration

# OpenAPI document (local JSON or YAML file)
spec = "apiDocumentation.json"

# API under test (overridden by --base-url or API_BASE_URL)
base_url = "https://api.practicesoftwaretesting.com"

# Per-request timeout in seconds
timeout_secs = 45

# Worker threads (defaults to the number of CPUs)
# jobs = 8

# Fail the run when the document declares fewer operations
# min_operations = 10

# Operations already exercised by hand-written tests; skipped here
covered_operations = [
    "get /products",
    "get /products/{productId}",
    "get /products/{id}",
    "get /brands",
    "get /categories",
    "post /payment/check",
]

# HTTP headers sent with every request
[headers]
Accept = "application/json"
# Authorization = "Bearer your-token-here"
"#
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Cannot read {0}: {1}")]
    Io(PathBuf, String),
    #[error("Parse error: {0}")]
    Parse(String),
}
