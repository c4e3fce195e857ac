//! In-memory transport for unit tests.

use std::collections::VecDeque;

use parking_lot::Mutex;

use crate::error::Result;
use crate::transport::{ApiRequest, ApiResponse, Transport};

/// Replays canned responses in order and records every request.
#[derive(Default)]
pub(crate) struct FakeTransport {
    responses: Mutex<VecDeque<Result<ApiResponse>>>,
    requests: Mutex<Vec<ApiRequest>>,
}

impl FakeTransport {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn respond(self, status: u16, body: &str) -> Self {
        self.push(Ok(ApiResponse {
            status,
            auth_token: None,
            body: body.as_bytes().to_vec(),
        }))
    }

    pub(crate) fn respond_json(self, status: u16, body: &serde_json::Value) -> Self {
        self.respond(status, &body.to_string())
    }

    pub(crate) fn respond_with_token(self, status: u16, token: &str) -> Self {
        self.push(Ok(ApiResponse {
            status,
            auth_token: Some(token.to_string()),
            body: Vec::new(),
        }))
    }

    pub(crate) fn fail(self, error: crate::Error) -> Self {
        self.push(Err(error))
    }

    fn push(self, response: Result<ApiResponse>) -> Self {
        self.responses.lock().push_back(response);
        self
    }

    pub(crate) fn requests(&self) -> Vec<ApiRequest> {
        self.requests.lock().clone()
    }

    pub(crate) fn paths(&self) -> Vec<String> {
        self.requests
            .lock()
            .iter()
            .map(|r| format!("{} {}", r.method, r.path))
            .collect()
    }
}

impl Transport for FakeTransport {
    async fn execute(&self, request: ApiRequest) -> Result<ApiResponse> {
        self.requests.lock().push(request);
        self.responses.lock().pop_front().unwrap_or_else(|| {
            Ok(ApiResponse {
                status: 500,
                auth_token: None,
                body: b"no canned response".to_vec(),
            })
        })
    }
}
