use std::collections::BTreeMap;

use serde_json::Value;

/// Normalised response returned by every [`TestClient`](super::TestClient).
///
/// Header names are lower-cased so comparisons against scenario files are
/// deterministic.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ResponseData {
    pub text: String,
    pub headers: BTreeMap<String, String>,
    pub status_code: u16,
}

impl ResponseData {
    pub fn new(status_code: u16, text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            headers: BTreeMap::new(),
            status_code,
        }
    }

    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.insert(name.to_ascii_lowercase(), value.into());
        self
    }

    /// Parse the body as JSON.
    pub fn json(&self) -> Result<Value, serde_json::Error> {
        serde_json::from_str(&self.text)
    }

    pub fn content_type(&self) -> Option<&str> {
        self.headers.get("content-type").map(String::as_str)
    }

    pub fn is_json(&self) -> bool {
        self.content_type().is_some_and(is_json_content_type)
    }
}

/// `application/json` or any `+json` media type; parameters are ignored.
pub fn is_json_content_type(content_type: &str) -> bool {
    let media_type = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();
    media_type == "application/json" || media_type.ends_with("+json")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_json_content_types() {
        assert!(is_json_content_type("application/json"));
        assert!(is_json_content_type("application/json; charset=utf-8"));
        assert!(is_json_content_type("application/problem+json"));
        assert!(!is_json_content_type("text/plain"));
    }

    #[test]
    fn header_names_are_lower_cased() {
        let response = ResponseData::new(200, "{}").with_header("Content-Type", "application/json");
        assert_eq!(response.content_type(), Some("application/json"));
        assert!(response.is_json());
    }

    #[test]
    fn json_accessor_reports_parse_errors() {
        assert!(ResponseData::new(200, "OK").json().is_err());
        assert_eq!(ResponseData::new(200, "[1]").json().unwrap(), serde_json::json!([1]));
    }
}
