use std::collections::BTreeMap;

use reqwest::blocking::Client;
use reqwest::header::{COOKIE, HeaderMap, HeaderName, HeaderValue};
use reqwest::redirect::Policy;
use tracing::debug;

use crate::error::{Error, Result};

use super::method::HttpMethod;
use super::request::RequestInput;
use super::response::ResponseData;

const MAX_REDIRECTS: usize = 10;

/// The transport a scenario runner sends its requests through.
///
/// Implementations must return header names lower-cased.
pub trait TestClient {
    fn get(&self, request: &RequestInput) -> Result<ResponseData>;

    fn post(&self, request: &RequestInput, body: &str) -> Result<ResponseData>;

    fn put(&self, request: &RequestInput, body: &str) -> Result<ResponseData>;

    fn patch(&self, request: &RequestInput, body: &str) -> Result<ResponseData>;

    fn delete(&self, request: &RequestInput) -> Result<ResponseData>;
}

/// Blocking reqwest client that resolves scenario URLs against a base URL.
#[derive(Debug, Clone)]
pub struct ReqwestClient {
    base_url: String,
    following: Client,
    direct: Client,
}

impl ReqwestClient {
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        // The redirect policy is fixed per client, so keep one of each.
        let following = Client::builder()
            .redirect(Policy::limited(MAX_REDIRECTS))
            .build()?;
        let direct = Client::builder().redirect(Policy::none()).build()?;

        Ok(Self {
            base_url: base_url.into(),
            following,
            direct,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn send(&self, method: HttpMethod, request: &RequestInput, body: Option<&str>) -> Result<ResponseData> {
        let client = if request.allow_redirects {
            &self.following
        } else {
            &self.direct
        };
        let url = join_url(&self.base_url, &request.url);

        let mut req_builder = client
            .request(method.into(), &url)
            .timeout(request.timeout)
            .headers(build_headers(&request.headers)?);

        if let Some(cookie) = cookie_header(&request.cookies) {
            let value = HeaderValue::from_str(&cookie)
                .map_err(|e| Error::InvalidHeader(format!("cookie: {e}")))?;
            req_builder = req_builder.header(COOKIE, value);
        }

        if let Some(body) = body {
            req_builder = req_builder.body(body.to_string());
        }

        debug!(%method, %url, "sending request");
        let response = req_builder.send()?;

        let status_code = response.status().as_u16();
        let headers = collect_headers(response.headers());
        let text = response.text()?;

        Ok(ResponseData {
            text,
            headers,
            status_code,
        })
    }
}

impl TestClient for ReqwestClient {
    fn get(&self, request: &RequestInput) -> Result<ResponseData> {
        self.send(HttpMethod::Get, request, None)
    }

    fn post(&self, request: &RequestInput, body: &str) -> Result<ResponseData> {
        self.send(HttpMethod::Post, request, Some(body))
    }

    fn put(&self, request: &RequestInput, body: &str) -> Result<ResponseData> {
        self.send(HttpMethod::Put, request, Some(body))
    }

    fn patch(&self, request: &RequestInput, body: &str) -> Result<ResponseData> {
        self.send(HttpMethod::Patch, request, Some(body))
    }

    fn delete(&self, request: &RequestInput) -> Result<ResponseData> {
        self.send(HttpMethod::Delete, request, None)
    }
}

fn join_url(base_url: &str, url: &str) -> String {
    if url.starts_with("http://") || url.starts_with("https://") || base_url.is_empty() {
        return url.to_string();
    }
    format!(
        "{}/{}",
        base_url.trim_end_matches('/'),
        url.trim_start_matches('/')
    )
}

pub fn build_headers(input: &BTreeMap<String, String>) -> Result<HeaderMap> {
    let mut headers = HeaderMap::new();

    for (key, value) in input {
        if key.is_empty() {
            continue;
        }

        let header_name = HeaderName::from_bytes(key.as_bytes())
            .map_err(|e| Error::InvalidHeader(format!("name `{key}`: {e}")))?;
        let header_value = HeaderValue::from_str(value)
            .map_err(|e| Error::InvalidHeader(format!("value for `{key}`: {e}")))?;
        headers.insert(header_name, header_value);
    }

    Ok(headers)
}

fn cookie_header(cookies: &BTreeMap<String, String>) -> Option<String> {
    if cookies.is_empty() {
        return None;
    }
    let pairs: Vec<String> = cookies
        .iter()
        .map(|(name, value)| format!("{name}={value}"))
        .collect();
    Some(pairs.join("; "))
}

fn collect_headers(headers: &HeaderMap) -> BTreeMap<String, String> {
    let mut collected: BTreeMap<String, String> = BTreeMap::new();
    for (name, value) in headers {
        let value = value.to_str().unwrap_or("<binary>");
        collected
            .entry(name.as_str().to_ascii_lowercase())
            .and_modify(|existing| {
                existing.push_str(", ");
                existing.push_str(value);
            })
            .or_insert_with(|| value.to_string());
    }
    collected
}
