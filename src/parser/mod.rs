//! # Scenario Parsers
//!
//! Turn one named record of a scenario file into [`TestData`]. Two formats
//! ship with the crate, selected through [`ParserKind`]:
//!
//! - [`JsonParser`]: plain JSON scenario files
//! - [`TemplateParser`]: JSON scenario files whose bodies contain
//!   `{{variable}}` placeholders
//!
//! Both apply the path-based [`ScenarioModifiers`] after loading.

mod json;
mod template;

pub use json::JsonParser;
pub use template::{TemplateParser, render};

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::debug;

use crate::error::{Error, Result};
use crate::json_path::{self, NoMatch};
use crate::scenario::{ScenarioRecord, TestData, resolve_body, store, string_map};

pub trait ScenarioParser {
    fn parse(
        &self,
        scenarios_dir: &Path,
        scenario_file: &str,
        test_name: &str,
        modifiers: &ScenarioModifiers,
    ) -> Result<TestData>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParserKind {
    #[default]
    Json,
    Template,
}

impl ParserKind {
    pub fn parser(self) -> Box<dyn ScenarioParser> {
        match self {
            ParserKind::Json => Box::new(JsonParser),
            ParserKind::Template => Box::new(TemplateParser),
        }
    }
}

/// Edits applied to a scenario while it is loaded.
///
/// Each `(path, value)` pair is applied in order with [`json_path::update`].
#[derive(Debug, Clone, Default)]
pub struct ScenarioModifiers {
    pub request_json: Vec<(String, Value)>,
    pub response_json: Vec<(String, Value)>,
    pub request_headers: Vec<(String, Value)>,
    pub response_headers: Vec<(String, Value)>,
    pub request_template_vars: BTreeMap<String, Value>,
    pub response_template_vars: BTreeMap<String, Value>,
}

impl ScenarioModifiers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn request_json(mut self, path: impl Into<String>, value: Value) -> Self {
        self.request_json.push((path.into(), value));
        self
    }

    pub fn response_json(mut self, path: impl Into<String>, value: Value) -> Self {
        self.response_json.push((path.into(), value));
        self
    }

    pub fn request_header(mut self, path: impl Into<String>, value: Value) -> Self {
        self.request_headers.push((path.into(), value));
        self
    }

    pub fn response_header(mut self, path: impl Into<String>, value: Value) -> Self {
        self.response_headers.push((path.into(), value));
        self
    }

    pub fn request_var(mut self, name: impl Into<String>, value: Value) -> Self {
        self.request_template_vars.insert(name.into(), value);
        self
    }

    pub fn response_var(mut self, name: impl Into<String>, value: Value) -> Self {
        self.response_template_vars.insert(name.into(), value);
        self
    }
}

/// A record with its bodies resolved but no modifiers applied yet.
struct LoadedScenario {
    name: String,
    file_path: PathBuf,
    record: ScenarioRecord,
    request: Option<String>,
    response: Option<String>,
}

fn load_scenario(scenarios_dir: &Path, scenario_file: &str, test_name: &str) -> Result<LoadedScenario> {
    let file_path = scenarios_dir.join(scenario_file);
    let record = ScenarioRecord::from_value(test_name, store::load_record(&file_path, test_name)?)?;

    let request = resolve_body(test_name, "request", record.request.as_ref(), scenarios_dir)?;
    let response = resolve_body(test_name, "response", record.response.as_ref(), scenarios_dir)?;
    debug!(test_name, method = %record.method, url = %record.url, "parsed scenario");

    Ok(LoadedScenario {
        name: test_name.to_string(),
        file_path,
        record,
        request,
        response,
    })
}

fn into_test_data(loaded: LoadedScenario, modifiers: &ScenarioModifiers) -> Result<TestData> {
    let LoadedScenario {
        name,
        file_path,
        record,
        request,
        response,
    } = loaded;

    let request = modify_body(&name, "request", request, &modifiers.request_json)?;
    let response = modify_body(&name, "response", response, &modifiers.response_json)?;

    let headers = modify_map(&name, "headers", record.headers.unwrap_or_default(), &modifiers.request_headers)?;
    let headers = string_map(&name, "headers", &headers, true)?;

    let expected_headers = match record.response_headers {
        Some(map) => Some(modify_map(&name, "response_headers", map, &modifiers.response_headers)?),
        None if !modifiers.response_headers.is_empty() => {
            Some(modify_map(&name, "response_headers", Map::new(), &modifiers.response_headers)?)
        }
        None => None,
    };
    let expected_headers = expected_headers
        .map(|map| string_map(&name, "response_headers", &map, true))
        .transpose()?;

    let cookies = record
        .cookies
        .map(|map| string_map(&name, "cookies", &map, false))
        .transpose()?
        .unwrap_or_default();

    Ok(TestData {
        name,
        url: record.url,
        method: record.method,
        allow_redirects: record.allow_redirects,
        headers,
        cookies,
        request_data: request,
        expected_status: record.status,
        expected_response: response,
        expected_headers,
        file_path,
        description: record.description,
    })
}

fn modify_body(
    name: &str,
    field: &str,
    body: Option<String>,
    modifiers: &[(String, Value)],
) -> Result<Option<String>> {
    if modifiers.is_empty() {
        return Ok(body);
    }

    let original: Value = serde_json::from_str(body.as_deref().unwrap_or("{}")).map_err(|e| {
        Error::scenario_format(name, format!("`{field}` must be JSON to apply modifiers: {e}"))
    })?;
    let modified = apply_updates(original, modifiers)?;
    Ok(Some(serde_json::to_string(&modified)?))
}

fn modify_map(
    name: &str,
    field: &str,
    map: Map<String, Value>,
    modifiers: &[(String, Value)],
) -> Result<Map<String, Value>> {
    match apply_updates(Value::Object(map), modifiers)? {
        Value::Object(map) => Ok(map),
        _ => Err(Error::scenario_format(name, format!("`{field}` modifiers must keep an object"))),
    }
}

fn apply_updates(value: Value, modifiers: &[(String, Value)]) -> Result<Value> {
    modifiers.iter().try_fold(value, |current, (path, new_value)| {
        Ok(json_path::update(&current, path, new_value.clone(), NoMatch::Skip)?)
    })
}
