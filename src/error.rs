//! Error types for restcase

use std::path::PathBuf;

use thiserror::Error;

use crate::json_path::PathError;
use crate::verify::VerificationFailure;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Path(#[from] PathError),

    #[error("Invalid scenario `{name}`: {reason}")]
    ScenarioFormat { name: String, reason: String },

    #[error("Scenario `{name}` not found in `{}`", path.display())]
    ScenarioNotFound { name: String, path: PathBuf },

    #[error("Unsupported HTTP method `{0}`")]
    UnsupportedMethod(String),

    #[error(transparent)]
    Verification(#[from] VerificationFailure),

    #[error("Failed to update scenario file `{}`: {reason}", path.display())]
    Persistence { path: PathBuf, reason: String },

    #[error("Failed to read `{}`: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid header {0}")]
    InvalidHeader(String),

    #[error("Request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl Error {
    pub(crate) fn scenario_format(name: &str, reason: impl Into<String>) -> Self {
        Error::ScenarioFormat {
            name: name.to_string(),
            reason: reason.into(),
        }
    }

    /// The verification failure carried by this error, if any.
    pub fn as_verification(&self) -> Option<&VerificationFailure> {
        match self {
            Error::Verification(failure) => Some(failure),
            _ => None,
        }
    }
}
