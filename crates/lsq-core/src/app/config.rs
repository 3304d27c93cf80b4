//! DispatchConfig - dispatch の設定
//!
//! JSON ファイルから読み込みます。省略したフィールドは既定値になります。
//!
//! ```json
//! {
//!   "default_language": "rust",
//!   "missing_context": "fail",
//!   "missing_context_overrides": { "textDocument/documentSymbol": "null_response" },
//!   "expected_methods": ["textDocument/hover", "shutdown"]
//! }
//! ```

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::domain::{DEFAULT_LANGUAGE, MissingContextPolicy};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DispatchConfig {
    /// Language tag used when a submission doesn't carry one.
    pub default_language: String,

    /// What to answer when no context can be built.
    pub missing_context: MissingContextPolicy,

    /// Per-method overrides of `missing_context`.
    pub missing_context_overrides: HashMap<String, MissingContextPolicy>,

    /// Methods that must have a handler at build time.
    pub expected_methods: Vec<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config: {0}")]
    Parse(#[from] serde_json::Error),
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            default_language: DEFAULT_LANGUAGE.to_string(),
            missing_context: MissingContextPolicy::default(),
            missing_context_overrides: HashMap::new(),
            expected_methods: Vec::new(),
        }
    }
}

impl DispatchConfig {
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&json)
    }

    pub fn missing_context_policy(&self, method: &str) -> MissingContextPolicy {
        self.missing_context_overrides
            .get(method)
            .copied()
            .unwrap_or(self.missing_context)
    }
}
