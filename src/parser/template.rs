use std::collections::BTreeMap;
use std::path::Path;

use serde_json::Value;

use crate::error::Result;
use crate::scenario::TestData;

use super::{ScenarioModifiers, ScenarioParser, into_test_data, load_scenario};

/// Parser for JSON scenario files with `{{variable}}` placeholders in their
/// request and response bodies.
///
/// Bodies are rendered before the path modifiers run, so modifiers see the
/// rendered JSON.
#[derive(Debug, Clone, Copy, Default)]
pub struct TemplateParser;

impl ScenarioParser for TemplateParser {
    fn parse(
        &self,
        scenarios_dir: &Path,
        scenario_file: &str,
        test_name: &str,
        modifiers: &ScenarioModifiers,
    ) -> Result<TestData> {
        let mut loaded = load_scenario(scenarios_dir, scenario_file, test_name)?;

        if !modifiers.request_template_vars.is_empty() {
            loaded.request = loaded
                .request
                .map(|body| render(&body, &modifiers.request_template_vars));
        }
        if !modifiers.response_template_vars.is_empty() {
            loaded.response = loaded
                .response
                .map(|body| render(&body, &modifiers.response_template_vars));
        }

        into_test_data(loaded, modifiers)
    }
}

/// Replace `{{name}}` and `{{ name }}` placeholders.
///
/// String values are inserted as-is, anything else as its JSON text. Unknown
/// placeholders are left untouched.
pub fn render(template: &str, variables: &BTreeMap<String, Value>) -> String {
    let mut result = template.to_string();
    for (key, value) in variables {
        let replacement = match value {
            Value::String(text) => text.clone(),
            other => other.to_string(),
        };
        result = result
            .replace(&format!("{{{{{key}}}}}"), &replacement)
            .replace(&format!("{{{{ {key} }}}}"), &replacement);
    }
    result
}
