//! # Scenario Runner
//!
//! Loads a scenario, applies the caller's edits, and sends it through a
//! [`TestClient`]. The returned [`TestResult`] is checked with
//! [`Verifier`](crate::verify::Verifier).

use std::collections::BTreeMap;

use tracing::debug;

use crate::config::RunnerConfig;
use crate::error::Result;
use crate::http::{HttpMethod, RequestInput, TestClient};
use crate::parser::{ScenarioModifiers, ScenarioParser};
use crate::scenario::{TestData, TestResult};

/// Final hook over the parsed scenario, run after URL parameters are filled.
pub type TestDataModifier = Box<dyn Fn(TestData) -> TestData>;

#[derive(Default)]
pub struct RunOptions {
    /// Values for `{name}` placeholders in the scenario URL
    pub url_params: BTreeMap<String, String>,
    pub modifiers: ScenarioModifiers,
    pub test_data_modifiers: Vec<TestDataModifier>,
}

impl RunOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn url_param(mut self, name: impl Into<String>, value: impl ToString) -> Self {
        self.url_params.insert(name.into(), value.to_string());
        self
    }

    pub fn modifiers(mut self, modifiers: ScenarioModifiers) -> Self {
        self.modifiers = modifiers;
        self
    }

    pub fn modify(mut self, modifier: impl Fn(TestData) -> TestData + 'static) -> Self {
        self.test_data_modifiers.push(Box::new(modifier));
        self
    }
}

pub struct TestCaseRunner<C> {
    client: C,
    config: RunnerConfig,
    parser: Box<dyn ScenarioParser>,
}

impl<C: TestClient> TestCaseRunner<C> {
    pub fn new(client: C, config: RunnerConfig) -> Self {
        let parser = config.parser.parser();
        Self {
            client,
            config,
            parser,
        }
    }

    /// Replace the parser selected by the configuration.
    pub fn with_parser(mut self, parser: Box<dyn ScenarioParser>) -> Self {
        self.parser = parser;
        self
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    pub fn config(&self) -> &RunnerConfig {
        &self.config
    }

    pub fn run(&self, scenario_file: &str, test_name: &str, options: RunOptions) -> Result<TestResult> {
        let test_data = self.test_data(scenario_file, test_name, options)?;
        self.execute(test_data)
    }

    /// Parse and prepare a scenario without sending it.
    pub fn test_data(&self, scenario_file: &str, test_name: &str, options: RunOptions) -> Result<TestData> {
        let mut test_data = self.parser.parse(
            &self.config.scenarios_dir,
            scenario_file,
            test_name,
            &options.modifiers,
        )?;

        if let Some(content_type) = &self.config.default_content_type {
            test_data
                .headers
                .entry("content-type".to_string())
                .or_insert_with(|| content_type.clone());
        }

        if !options.url_params.is_empty() {
            test_data.url = fill_url_params(&test_data.url, &options.url_params);
        }

        Ok(options
            .test_data_modifiers
            .iter()
            .fold(test_data, |data, modifier| modifier(data)))
    }

    /// Send an already prepared scenario.
    pub fn execute(&self, test_data: TestData) -> Result<TestResult> {
        let method: HttpMethod = test_data.method.parse()?;
        let request = RequestInput {
            url: test_data.url.clone(),
            timeout: self.config.request_timeout(),
            allow_redirects: test_data.allow_redirects,
            headers: test_data.headers.clone(),
            cookies: test_data.cookies.clone(),
        };
        let body = test_data.request_data.as_deref().unwrap_or_default();

        debug!(
            test_name = %test_data.name,
            %method,
            url = %request.url,
            with_body = method.has_body(),
            "running scenario"
        );
        let response = match method {
            HttpMethod::Get => self.client.get(&request)?,
            HttpMethod::Post => self.client.post(&request, body)?,
            HttpMethod::Put => self.client.put(&request, body)?,
            HttpMethod::Patch => self.client.patch(&request, body)?,
            HttpMethod::Delete => self.client.delete(&request)?,
        };

        Ok(TestResult {
            response,
            test_data,
        })
    }
}

/// Substitute `{name}` placeholders in one pass. Unknown placeholders are
/// kept, and substituted values are never rescanned.
fn fill_url_params(url: &str, params: &BTreeMap<String, String>) -> String {
    let mut filled = String::with_capacity(url.len());
    let mut rest = url;

    while let Some(open) = rest.find('{') {
        filled.push_str(&rest[..open]);
        let after_open = &rest[open + 1..];
        let Some(close) = after_open.find('}') else {
            filled.push_str(&rest[open..]);
            return filled;
        };

        let name = &after_open[..close];
        match params.get(name) {
            Some(value) => filled.push_str(value),
            None => filled.push_str(&rest[open..open + close + 2]),
        }
        rest = &after_open[close + 1..];
    }

    filled.push_str(rest);
    filled
}
