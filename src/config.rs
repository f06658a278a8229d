//! Harness configuration

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::parser::ParserKind;

/// Top-level configuration, usually loaded from a TOML file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HarnessConfig {
    pub runner: RunnerConfig,
    pub verify: VerifyConfig,
}

impl HarnessConfig {
    pub fn from_toml_str(raw: &str) -> Result<Self> {
        toml::from_str(raw).map_err(|e| Error::Config(e.to_string()))
    }

    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path).map_err(|source| Error::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&raw)
    }
}

/// How scenarios are located, loaded and sent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunnerConfig {
    /// Directory scenario files and `file::` bodies are resolved against
    pub scenarios_dir: PathBuf,

    /// Per-request timeout in seconds
    pub request_timeout_secs: u64,

    /// Added as `content-type` to every request that does not set one
    pub default_content_type: Option<String>,

    /// Scenario file format
    pub parser: ParserKind,
}

impl RunnerConfig {
    pub fn new(scenarios_dir: impl Into<PathBuf>) -> Self {
        Self {
            scenarios_dir: scenarios_dir.into(),
            ..Self::default()
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            scenarios_dir: PathBuf::from("."),
            request_timeout_secs: 10,
            default_content_type: None,
            parser: ParserKind::Json,
        }
    }
}

/// What the verifier does when a scenario fails.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VerifyConfig {
    /// Rewrite the scenario file with the observed response on failure
    pub update_scenarios_on_fail: bool,

    /// Also capture response headers when rewriting. Off by default since
    /// headers such as `date` or `content-length` make scenarios brittle.
    pub update_headers: bool,
}
