use std::cell::RefCell;

use crate::error::Result;
use crate::http::{HttpMethod, RequestInput, ResponseData, TestClient};

#[derive(Debug, Clone)]
pub(crate) struct Call {
    pub method: HttpMethod,
    pub request: RequestInput,
    pub body: Option<String>,
}

/// Answers every request with the same canned response and records the calls.
pub(crate) struct StubClient {
    response: ResponseData,
    pub calls: RefCell<Vec<Call>>,
}

impl StubClient {
    pub fn new(response: ResponseData) -> Self {
        Self {
            response,
            calls: RefCell::new(Vec::new()),
        }
    }

    pub fn last_call(&self) -> Call {
        self.calls.borrow().last().cloned().expect("no request was sent")
    }

    fn record(&self, method: HttpMethod, request: &RequestInput, body: Option<&str>) -> Result<ResponseData> {
        self.calls.borrow_mut().push(Call {
            method,
            request: request.clone(),
            body: body.map(str::to_string),
        });
        Ok(self.response.clone())
    }
}

impl TestClient for StubClient {
    fn get(&self, request: &RequestInput) -> Result<ResponseData> {
        self.record(HttpMethod::Get, request, None)
    }

    fn post(&self, request: &RequestInput, body: &str) -> Result<ResponseData> {
        self.record(HttpMethod::Post, request, Some(body))
    }

    fn put(&self, request: &RequestInput, body: &str) -> Result<ResponseData> {
        self.record(HttpMethod::Put, request, Some(body))
    }

    fn patch(&self, request: &RequestInput, body: &str) -> Result<ResponseData> {
        self.record(HttpMethod::Patch, request, Some(body))
    }

    fn delete(&self, request: &RequestInput) -> Result<ResponseData> {
        self.record(HttpMethod::Delete, request, None)
    }
}
