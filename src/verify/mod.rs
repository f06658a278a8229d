//! # Verification
//!
//! Compares an executed scenario against its expectations:
//!
//! 1. excluded paths are removed from the actual and expected bodies
//! 2. status code
//! 3. body, with the default or a caller-supplied verifier
//! 4. response headers, when the scenario lists any
//!
//! When [`VerifyConfig::update_scenarios_on_fail`] is set, a failing scenario
//! is rewritten with the observed response before the failure is returned.

use std::collections::BTreeMap;
use std::fmt::{self, Display};

use serde_json::Value;
use tracing::{debug, error, warn};

use crate::config::VerifyConfig;
use crate::error::Result;
use crate::json_path::{self, NoMatch};
use crate::scenario::{TestResult, store};

/// Custom body check. Returns a description of the mismatch on failure.
pub type BodyVerifier<'a> = Box<dyn Fn(&TestResult) -> std::result::Result<(), String> + 'a>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MismatchKind {
    Status,
    Body,
    Headers,
}

impl Display for MismatchKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            MismatchKind::Status => "status",
            MismatchKind::Body => "body",
            MismatchKind::Headers => "headers",
        };
        write!(f, "{label}")
    }
}

/// A scenario did not match the observed response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerificationFailure {
    pub test_name: String,
    pub kind: MismatchKind,
    pub message: String,
    /// Set when the scenario file should have been updated but could not be.
    pub self_heal_error: Option<String>,
}

impl Display for VerificationFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Scenario `{}` failed ({} mismatch)\n{}",
            self.test_name, self.kind, self.message
        )?;
        if let Some(reason) = &self.self_heal_error {
            write!(f, "\n\nScenario file was not updated: {reason}")?;
        }
        Ok(())
    }
}

impl std::error::Error for VerificationFailure {}

#[derive(Default)]
pub struct VerifyOptions<'a> {
    /// Paths removed from both bodies before comparison
    pub excluded_response_paths: Vec<String>,
    pub body_verifier: Option<BodyVerifier<'a>>,
}

impl<'a> VerifyOptions<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn exclude(mut self, path: impl Into<String>) -> Self {
        self.excluded_response_paths.push(path.into());
        self
    }

    pub fn body_verifier(
        mut self,
        verifier: impl Fn(&TestResult) -> std::result::Result<(), String> + 'a,
    ) -> Self {
        self.body_verifier = Some(Box::new(verifier));
        self
    }
}

#[derive(Debug, Clone, Default)]
pub struct Verifier {
    config: VerifyConfig,
}

impl Verifier {
    pub fn new(config: VerifyConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &VerifyConfig {
        &self.config
    }

    pub fn verify(&self, result: &TestResult, options: &VerifyOptions<'_>) -> Result<()> {
        let compared = redact(result, &options.excluded_response_paths)?;

        let Err(mut failure) = check(&compared, options) else {
            debug!(test_name = %result.test_data.name, "scenario passed");
            return Ok(());
        };
        warn!(test_name = %failure.test_name, kind = %failure.kind, "scenario failed");

        if self.config.update_scenarios_on_fail {
            // The unredacted response is what gets stored.
            if let Err(e) = store::update_scenario_on_fail(result, self.config.update_headers) {
                error!(test_name = %failure.test_name, error = %e, "failed to update scenario file");
                failure.self_heal_error = Some(e.to_string());
            }
        }

        Err(failure.into())
    }
}

/// Structural comparison for JSON responses, exact text comparison otherwise.
///
/// Scenarios without an expected body always pass.
pub fn default_body_verifier(result: &TestResult) -> std::result::Result<(), String> {
    let Some(expected) = result
        .test_data
        .expected_response
        .as_deref()
        .filter(|body| !body.is_empty())
    else {
        return Ok(());
    };

    if result.response.is_json() {
        let expected: Value = serde_json::from_str(expected)
            .map_err(|e| format!("Expected response is not valid JSON: {e}"))?;
        let actual = result
            .response
            .json()
            .map_err(|e| format!("Actual response is not valid JSON: {e}"))?;
        if expected != actual {
            return Err("Response body does not match".to_string());
        }
    } else if expected != result.response.text {
        return Err("Response body does not match".to_string());
    }

    Ok(())
}

fn check(result: &TestResult, options: &VerifyOptions<'_>) -> std::result::Result<(), VerificationFailure> {
    let expected_status = result.test_data.expected_status;
    let actual_status = result.response.status_code;
    if expected_status != actual_status {
        return Err(failure(
            result,
            MismatchKind::Status,
            format!("Expected status {expected_status}, got {actual_status}"),
        ));
    }

    let body_check = match &options.body_verifier {
        Some(verifier) => verifier(result),
        None => default_body_verifier(result),
    };
    body_check.map_err(|reason| failure(result, MismatchKind::Body, reason))?;

    if let Some(expected) = result
        .test_data
        .expected_headers
        .as_ref()
        .filter(|headers| !headers.is_empty())
    {
        let actual = &result.response.headers;
        if expected != actual {
            let reason = format!(
                "Response headers do not match\nExpected Headers:\n{}\n\nActual Headers:\n{}",
                format_headers(expected),
                format_headers(actual)
            );
            return Err(failure(result, MismatchKind::Headers, reason));
        }
    }

    Ok(())
}

fn redact(result: &TestResult, paths: &[String]) -> Result<TestResult> {
    let mut redacted = result.clone();
    if paths.is_empty() {
        return Ok(redacted);
    }

    redacted.response.text = redact_body(&result.response.text, paths)?;
    if let Some(expected) = &result.test_data.expected_response {
        redacted.test_data.expected_response = Some(redact_body(expected, paths)?);
    }
    Ok(redacted)
}

/// Non-JSON bodies are returned unchanged.
fn redact_body(body: &str, paths: &[String]) -> Result<String> {
    let Ok(original) = serde_json::from_str::<Value>(body) else {
        return Ok(body.to_string());
    };

    let redacted = paths.iter().try_fold(original.clone(), |current, path| {
        json_path::remove(&current, path, NoMatch::Skip)
    })?;

    if redacted == original {
        Ok(body.to_string())
    } else {
        Ok(serde_json::to_string(&redacted)?)
    }
}

fn failure(result: &TestResult, kind: MismatchKind, reason: String) -> VerificationFailure {
    let mut sections = Vec::new();
    if let Some(description) = &result.test_data.description {
        sections.push(format!("Description: {description}"));
    }
    sections.push(reason);
    sections.push(String::new());
    sections.push("Expected Response:".to_string());
    sections.push(format_body(result.test_data.expected_response.as_deref()));
    sections.push(String::new());
    sections.push("Actual Response:".to_string());
    sections.push(format_body(Some(&result.response.text)));

    VerificationFailure {
        test_name: result.test_data.name.clone(),
        kind,
        message: sections.join("\n"),
        self_heal_error: None,
    }
}

fn format_body(body: Option<&str>) -> String {
    match body {
        None | Some("") => "<None>".to_string(),
        Some(raw) => serde_json::from_str::<Value>(raw)
            .ok()
            .and_then(|json| serde_json::to_string_pretty(&json).ok())
            .unwrap_or_else(|| raw.to_string()),
    }
}

fn format_headers(headers: &BTreeMap<String, String>) -> String {
    if headers.is_empty() {
        return "<None>".to_string();
    }
    let lines: Vec<String> = headers
        .iter()
        .map(|(name, value)| format!("{name}: {value}"))
        .collect();
    lines.join("\n")
}
