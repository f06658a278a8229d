//! # Scenarios
//!
//! A scenario file is a JSON object mapping test names to records:
//!
//! ```json
//! {
//!     "test_get_item__200": {
//!         "url": "/items/{item_id}",
//!         "method": "GET",
//!         "status": 200,
//!         "response": {"id": 1, "name": "item1"}
//!     }
//! }
//! ```
//!
//! `request` and `response` may be inline JSON, a raw string, or a
//! `file::<relative path>` reference to a sibling file.

pub mod store;

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use serde_json::{Map, Value};

use crate::error::{Error, Result};
use crate::http::ResponseData;

/// Prefix marking a body stored in a separate file.
pub const EXTERNAL_FILE_PREFIX: &str = "file::";

/// One entry of a scenario file, as stored on disk.
#[derive(Debug, Clone, Deserialize)]
pub struct ScenarioRecord {
    pub url: String,
    pub method: String,
    pub status: u16,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub headers: Option<Map<String, Value>>,
    #[serde(default)]
    pub cookies: Option<Map<String, Value>>,
    #[serde(default)]
    pub request: Option<Value>,
    #[serde(default)]
    pub response: Option<Value>,
    #[serde(default)]
    pub response_headers: Option<Map<String, Value>>,
    #[serde(default = "default_allow_redirects")]
    pub allow_redirects: bool,
}

fn default_allow_redirects() -> bool {
    true
}

impl ScenarioRecord {
    pub fn from_value(name: &str, value: Value) -> Result<Self> {
        serde_json::from_value(value).map_err(|e| Error::scenario_format(name, e.to_string()))
    }
}

/// A scenario resolved into the shape a runner sends and a verifier checks.
#[derive(Debug, Clone, PartialEq)]
pub struct TestData {
    pub name: String,
    pub url: String,
    pub method: String,
    pub allow_redirects: bool,
    pub headers: BTreeMap<String, String>,
    pub cookies: BTreeMap<String, String>,
    pub request_data: Option<String>,
    pub expected_status: u16,
    pub expected_response: Option<String>,
    pub expected_headers: Option<BTreeMap<String, String>>,
    pub file_path: PathBuf,
    pub description: Option<String>,
}

impl TestData {
    pub fn request_data_json(&self) -> Result<Value> {
        Ok(serde_json::from_str(self.request_data.as_deref().unwrap_or("null"))?)
    }

    pub fn expected_response_json(&self) -> Result<Value> {
        Ok(serde_json::from_str(self.expected_response.as_deref().unwrap_or("null"))?)
    }
}

/// The outcome of running one scenario, ready for verification.
#[derive(Debug, Clone)]
pub struct TestResult {
    pub response: ResponseData,
    pub test_data: TestData,
}

/// Turn a `request`/`response` field into the body string it describes.
pub fn resolve_body(
    name: &str,
    field: &str,
    value: Option<&Value>,
    scenarios_dir: &Path,
) -> Result<Option<String>> {
    match value {
        None | Some(Value::Null) => Ok(None),
        Some(body @ (Value::Object(_) | Value::Array(_))) => Ok(Some(serde_json::to_string(body)?)),
        Some(Value::String(raw)) => match raw.strip_prefix(EXTERNAL_FILE_PREFIX) {
            Some(relative) => {
                let path = scenarios_dir.join(relative);
                let contents = fs::read_to_string(&path).map_err(|source| Error::Io { path, source })?;
                Ok(Some(contents.trim().to_string()))
            }
            None => Ok(Some(raw.clone())),
        },
        Some(_) => Err(Error::scenario_format(
            name,
            format!("`{field}` must be JSON, a string or a `{EXTERNAL_FILE_PREFIX}` reference"),
        )),
    }
}

/// Flatten a header or cookie object into strings.
///
/// Header names are lower-cased when `lower_case_keys` is set.
pub fn string_map(
    name: &str,
    field: &str,
    map: &Map<String, Value>,
    lower_case_keys: bool,
) -> Result<BTreeMap<String, String>> {
    map.iter()
        .map(|(key, value)| {
            let key = if lower_case_keys {
                key.to_ascii_lowercase()
            } else {
                key.clone()
            };
            let value = match value {
                Value::String(text) => text.clone(),
                Value::Object(_) | Value::Array(_) => {
                    return Err(Error::scenario_format(
                        name,
                        format!("`{field}.{key}` must be a scalar value"),
                    ));
                }
                scalar => scalar.to_string(),
            };
            Ok((key, value))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn record_defaults_allow_redirects() {
        let record = ScenarioRecord::from_value(
            "t",
            json!({"url": "/status", "method": "GET", "status": 200}),
        )
        .unwrap();
        assert!(record.allow_redirects);
        assert!(record.response.is_none());
    }

    #[test]
    fn record_requires_typed_fields() {
        let err = ScenarioRecord::from_value("t", json!({"url": "/", "method": "GET", "status": "200"}))
            .unwrap_err();
        assert!(matches!(err, Error::ScenarioFormat { name, .. } if name == "t"));

        let err = ScenarioRecord::from_value("t", json!({"url": "/", "status": 200})).unwrap_err();
        assert!(matches!(err, Error::ScenarioFormat { .. }));
    }

    #[test]
    fn inline_bodies_are_serialised() {
        let dir = Path::new(".");
        let body = resolve_body("t", "request", Some(&json!({"name": "alex"})), dir).unwrap();
        assert_eq!(body.as_deref(), Some(r#"{"name":"alex"}"#));
        assert_eq!(resolve_body("t", "request", Some(&json!("OK")), dir).unwrap().as_deref(), Some("OK"));
        assert_eq!(resolve_body("t", "request", None, dir).unwrap(), None);
        assert_eq!(resolve_body("t", "request", Some(&Value::Null), dir).unwrap(), None);
    }

    #[test]
    fn external_bodies_are_read_and_trimmed() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("item.json"), "  {\"name\": \"item\"}\n").unwrap();

        let body = resolve_body("t", "response", Some(&json!("file::item.json")), dir.path()).unwrap();
        assert_eq!(body.as_deref(), Some("{\"name\": \"item\"}"));

        let missing = resolve_body("t", "response", Some(&json!("file::nope.json")), dir.path());
        assert!(matches!(missing, Err(Error::Io { .. })));
    }

    #[test]
    fn scalar_bodies_are_rejected() {
        let err = resolve_body("t", "response", Some(&json!(12)), Path::new(".")).unwrap_err();
        assert!(matches!(err, Error::ScenarioFormat { .. }));
    }

    #[test]
    fn header_maps_are_lower_cased_and_stringified() {
        let map = json!({"Content-Type": "application/json", "X-Retry": 3});
        let headers = string_map("t", "headers", map.as_object().unwrap(), true).unwrap();
        assert_eq!(headers.get("content-type").map(String::as_str), Some("application/json"));
        assert_eq!(headers.get("x-retry").map(String::as_str), Some("3"));

        let nested = json!({"a": {"b": 1}});
        assert!(string_map("t", "cookies", nested.as_object().unwrap(), false).is_err());
    }

    #[test]
    fn json_helpers_parse_bodies() {
        let data = TestData {
            name: "t".into(),
            url: "/".into(),
            method: "POST".into(),
            allow_redirects: true,
            headers: BTreeMap::new(),
            cookies: BTreeMap::new(),
            request_data: Some(r#"{"name":"blah"}"#.into()),
            expected_status: 200,
            expected_response: None,
            expected_headers: None,
            file_path: PathBuf::from("scenarios.json"),
            description: None,
        };
        assert_eq!(data.request_data_json().unwrap(), json!({"name": "blah"}));
        assert_eq!(data.expected_response_json().unwrap(), Value::Null);
    }
}
