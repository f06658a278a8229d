//! Reading and rewriting scenario files.
//!
//! Rewrites are a plain read-modify-write of the whole file. No lock is
//! taken, so two runs healing the same file at once, or a run killed
//! mid-write, can leave it corrupted.

use std::fs;
use std::path::Path;

use serde_json::{Map, Value};
use tracing::{debug, info};

use crate::error::{Error, Result};

use super::TestResult;

pub fn load_scenario_file(path: &Path) -> Result<Map<String, Value>> {
    let raw = fs::read_to_string(path).map_err(|source| Error::Io {
        path: path.to_path_buf(),
        source,
    })?;
    match serde_json::from_str(&raw)? {
        Value::Object(scenarios) => Ok(scenarios),
        _ => Err(Error::scenario_format(
            &path.display().to_string(),
            "scenario file must contain a JSON object",
        )),
    }
}

/// Fetch one record from a scenario file by test name.
pub fn load_record(path: &Path, test_name: &str) -> Result<Value> {
    let mut scenarios = load_scenario_file(path)?;
    debug!(file = %path.display(), test_name, "loaded scenario file");
    scenarios.remove(test_name).ok_or_else(|| Error::ScenarioNotFound {
        name: test_name.to_string(),
        path: path.to_path_buf(),
    })
}

/// Overwrite the stored expectations of `result`'s scenario with what the
/// server actually returned.
///
/// `status` is always replaced. `response` becomes the parsed JSON body when
/// the response is a JSON object or array, the raw text otherwise, and is
/// dropped when the body is empty. `response_headers` is only replaced when `update_headers` is set.
pub fn update_scenario_on_fail(result: &TestResult, update_headers: bool) -> Result<()> {
    let path = result.test_data.file_path.as_path();
    let test_name = result.test_data.name.as_str();

    let mut scenarios = read_for_update(path)?;
    let record = scenarios
        .get_mut(test_name)
        .and_then(Value::as_object_mut)
        .ok_or_else(|| persistence(path, format!("no scenario object named `{test_name}`")))?;

    let response = &result.response;
    record.insert("status".to_string(), Value::from(response.status_code));

    if response.text.is_empty() {
        record.shift_remove("response");
    } else {
        // Scalar JSON bodies are kept as text; only objects and arrays load back inline.
        let body = match response.json() {
            Ok(body @ (Value::Object(_) | Value::Array(_))) if response.is_json() => body,
            _ => Value::String(response.text.clone()),
        };
        record.insert("response".to_string(), body);
    }

    if update_headers {
        let headers: Map<String, Value> = response
            .headers
            .iter()
            .map(|(name, value)| (name.clone(), Value::String(value.clone())))
            .collect();
        record.insert("response_headers".to_string(), Value::Object(headers));
    }

    write_for_update(path, &scenarios)?;
    info!(file = %path.display(), test_name, status = response.status_code, "updated scenario expectations");
    Ok(())
}

fn read_for_update(path: &Path) -> Result<Map<String, Value>> {
    let raw = fs::read_to_string(path).map_err(|e| persistence(path, format!("read failed: {e}")))?;
    match serde_json::from_str(&raw) {
        Ok(Value::Object(scenarios)) => Ok(scenarios),
        Ok(_) => Err(persistence(path, "scenario file must contain a JSON object")),
        Err(e) => Err(persistence(path, format!("parse failed: {e}"))),
    }
}

fn write_for_update(path: &Path, scenarios: &Map<String, Value>) -> Result<()> {
    let mut raw = serde_json::to_string_pretty(scenarios)
        .map_err(|e| persistence(path, format!("serialize failed: {e}")))?;
    raw.push('\n');
    fs::write(path, raw).map_err(|e| persistence(path, format!("write failed: {e}")))
}

fn persistence(path: &Path, reason: impl Into<String>) -> Error {
    Error::Persistence {
        path: path.to_path_buf(),
        reason: reason.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::ResponseData;
    use crate::parser::{JsonParser, ScenarioModifiers, ScenarioParser};
    use crate::scenario::TestData;
    use serde_json::json;
    use std::collections::BTreeMap;
    use std::path::PathBuf;

    fn write_scenarios(dir: &Path, scenarios: Value) -> PathBuf {
        let path = dir.join("scenarios.json");
        fs::write(&path, serde_json::to_string_pretty(&scenarios).unwrap()).unwrap();
        path
    }

    fn result_for(path: PathBuf, name: &str, response: ResponseData) -> TestResult {
        TestResult {
            response,
            test_data: TestData {
                name: name.to_string(),
                url: "/items/1".into(),
                method: "GET".into(),
                allow_redirects: true,
                headers: BTreeMap::new(),
                cookies: BTreeMap::new(),
                request_data: None,
                expected_status: 200,
                expected_response: Some(r#"{"id":1}"#.into()),
                expected_headers: None,
                file_path: path,
                description: None,
            },
        }
    }

    fn read_back(path: &Path) -> Value {
        serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap()
    }

    #[test]
    fn load_record_reports_missing_tests() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_scenarios(dir.path(), json!({"a": {"url": "/", "method": "GET", "status": 200}}));

        assert_eq!(load_record(&path, "a").unwrap()["status"], json!(200));
        assert!(matches!(load_record(&path, "b"), Err(Error::ScenarioNotFound { .. })));
    }

    #[test]
    fn heals_status_and_json_body() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_scenarios(
            dir.path(),
            json!({
                "get_item": {"url": "/items/1", "method": "GET", "status": 200, "response": {"id": 1}},
                "other": {"url": "/", "method": "GET", "status": 204}
            }),
        );
        let response = ResponseData::new(404, r#"{"detail":"not found"}"#)
            .with_header("content-type", "application/json");

        update_scenario_on_fail(&result_for(path.clone(), "get_item", response), false).unwrap();

        let healed = read_back(&path);
        assert_eq!(
            healed["get_item"],
            json!({"url": "/items/1", "method": "GET", "status": 404, "response": {"detail": "not found"}})
        );
        assert_eq!(healed["other"]["status"], json!(204));
    }

    #[test]
    fn heals_text_body_and_drops_empty_body() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_scenarios(
            dir.path(),
            json!({"t": {"url": "/", "method": "GET", "status": 200, "response": "OK"}}),
        );

        let text = ResponseData::new(503, "down").with_header("content-type", "text/plain");
        update_scenario_on_fail(&result_for(path.clone(), "t", text), false).unwrap();
        assert_eq!(read_back(&path)["t"]["response"], json!("down"));

        update_scenario_on_fail(&result_for(path.clone(), "t", ResponseData::new(401, "")), false).unwrap();
        let healed = read_back(&path);
        assert_eq!(healed["t"]["status"], json!(401));
        assert!(healed["t"].get("response").is_none());
    }

    #[test]
    fn scalar_json_bodies_heal_into_loadable_records() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_scenarios(
            dir.path(),
            json!({"t": {"url": "/", "method": "GET", "status": 200, "response": {"id": 1}}}),
        );

        for (body, stored) in [("42", json!("42")), ("null", json!("null")), (r#""text""#, json!(r#""text""#))] {
            let response = ResponseData::new(200, body).with_header("content-type", "application/json");
            update_scenario_on_fail(&result_for(path.clone(), "t", response), false).unwrap();
            assert_eq!(read_back(&path)["t"]["response"], stored);

            let data = JsonParser
                .parse(dir.path(), "scenarios.json", "t", &ScenarioModifiers::new())
                .unwrap();
            assert_eq!(data.expected_response.as_deref(), Some(body));
        }
    }

    #[test]
    fn headers_only_written_when_enabled() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_scenarios(dir.path(), json!({"t": {"url": "/", "method": "GET", "status": 200}}));
        let response = ResponseData::new(200, "OK").with_header("X-Test", "t3st");

        update_scenario_on_fail(&result_for(path.clone(), "t", response.clone()), false).unwrap();
        assert!(read_back(&path)["t"].get("response_headers").is_none());

        update_scenario_on_fail(&result_for(path.clone(), "t", response), true).unwrap();
        assert_eq!(read_back(&path)["t"]["response_headers"], json!({"x-test": "t3st"}));
    }

    #[test]
    fn missing_file_is_a_persistence_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = result_for(dir.path().join("gone.json"), "t", ResponseData::new(200, ""));
        assert!(matches!(
            update_scenario_on_fail(&result, false),
            Err(Error::Persistence { .. })
        ));
    }
}
