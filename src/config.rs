//! Analyzer configuration.
//!
//! Defaults match the built-in behavior; an optional `analyzer.toml` in
//! the working directory overrides them. The namespace-isolation env var
//! takes precedence over the file (see [`crate::registry::LoaderMode`]).

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Filename of the optional configuration file.
pub const CONFIG_FILENAME: &str = "analyzer.toml";

/// Analyzer configuration, loaded from `analyzer.toml` when present.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyzerConfig {
    /// Stage loader behavior.
    pub loader: LoaderConfig,

    /// Transform tuning.
    pub transforms: TransformsConfig,

    /// Input reader limits.
    pub input: InputConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoaderConfig {
    /// Give each requested stage its own isolated instance. When false,
    /// the loader behaves like a classic shared-module loader and rejects
    /// duplicate stage names.
    pub namespace_isolation: bool,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            namespace_isolation: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TransformsConfig {
    /// Pause between bytes emitted by the typewriter stage, in
    /// milliseconds.
    pub typewriter_delay_ms: u64,
}

impl Default for TransformsConfig {
    fn default() -> Self {
        Self {
            typewriter_delay_ms: 100,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct InputConfig {
    /// Longest line accepted in one piece; longer reads are split at this
    /// boundary.
    pub max_line_bytes: usize,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            max_line_bytes: 1024,
        }
    }
}

impl AnalyzerConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Load `analyzer.toml` from the working directory. Returns
    /// `Ok(None)` if the file does not exist, `Err` if malformed.
    pub fn load_optional() -> anyhow::Result<Option<Self>> {
        let path = Path::new(CONFIG_FILENAME);
        if !path.exists() {
            return Ok(None);
        }
        Ok(Some(Self::load(path)?))
    }

    /// Typewriter per-byte pause as a [`Duration`].
    pub fn typewriter_delay(&self) -> Duration {
        Duration::from_millis(self.transforms.typewriter_delay_ms)
    }
}
