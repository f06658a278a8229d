use std::collections::BTreeMap;
use std::time::Duration;

/// Everything a client needs to issue one request, apart from the body.
#[derive(Debug, Clone)]
pub struct RequestInput {
    pub url: String,
    pub timeout: Duration,
    pub allow_redirects: bool,
    pub headers: BTreeMap<String, String>,
    pub cookies: BTreeMap<String, String>,
}
