//! Declarative REST API scenarios.
//!
//! Scenarios are stored as named records in JSON files. A
//! [`TestCaseRunner`] loads one, applies the caller's edits and sends it
//! through a [`TestClient`]. A [`Verifier`] then checks the response against
//! the recorded expectations and can rewrite them when they drift.
//!
//! ```no_run
//! use restcase::{HarnessConfig, ReqwestClient, RunOptions, TestCaseRunner, Verifier, VerifyOptions};
//!
//! # fn main() -> restcase::Result<()> {
//! let config = HarnessConfig::load("restcase.toml".as_ref())?;
//! let runner = TestCaseRunner::new(ReqwestClient::new("http://localhost:8000")?, config.runner);
//! let verifier = Verifier::new(config.verify);
//!
//! let result = runner.run("items.json", "test_get_item__200", RunOptions::new().url_param("item_id", 1))?;
//! verifier.verify(&result, &VerifyOptions::new().exclude("created_at"))?;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod http;
pub mod json_path;
pub mod parser;
pub mod runner;
pub mod scenario;
pub mod verify;

#[cfg(test)]
pub(crate) mod test_support;

pub use config::{HarnessConfig, RunnerConfig, VerifyConfig};
pub use error::{Error, Result};
pub use http::{HttpMethod, ReqwestClient, RequestInput, ResponseData, TestClient};
pub use json_path::{JsonPath, NoMatch, PathError};
pub use parser::{JsonParser, ParserKind, ScenarioModifiers, ScenarioParser, TemplateParser};
pub use runner::{RunOptions, TestCaseRunner};
pub use scenario::{TestData, TestResult};
pub use verify::{MismatchKind, VerificationFailure, Verifier, VerifyOptions};
