//! Scripted transport and fixtures shared by unit tests.

use std::collections::VecDeque;
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use http::header::HeaderName;
use http::{HeaderMap, Method, Request, Response, StatusCode};
use http_body_util::BodyExt;
use parking_lot::Mutex;
use ufile_auth::{RustCryptoProvider, Signer};

use crate::body::FeederBody;
use crate::config::UfileConfig;
use crate::error::{UfileError, UfileResult};
use crate::request::RequestDriver;
use crate::transport::HttpTransport;

/// A request as seen by [`MockTransport`], with its body collected.
#[derive(Debug, Clone)]
pub(crate) struct RecordedRequest {
    pub method: Method,
    pub uri: String,
    pub headers: HeaderMap,
    pub body: Bytes,
}

/// Replays queued responses in order and records every request.
#[derive(Debug, Default)]
pub(crate) struct MockTransport {
    responses: Mutex<VecDeque<UfileResult<Response<Bytes>>>>,
    requests: Mutex<Vec<RecordedRequest>>,
}

impl MockTransport {
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub(crate) fn respond(&self, status: StatusCode, body: impl Into<Bytes>) {
        let response = Response::builder()
            .status(status)
            .body(body.into())
            .unwrap();
        self.responses.lock().push_back(Ok(response));
    }

    pub(crate) fn respond_json(&self, status: StatusCode, body: &serde_json::Value) {
        self.respond(status, body.to_string());
    }

    pub(crate) fn respond_with_header(
        &self,
        status: StatusCode,
        name: HeaderName,
        value: &str,
        body: impl Into<Bytes>,
    ) {
        let response = Response::builder()
            .status(status)
            .header(name, value)
            .body(body.into())
            .unwrap();
        self.responses.lock().push_back(Ok(response));
    }

    pub(crate) fn fail(&self, message: &str) {
        self.responses
            .lock()
            .push_back(Err(UfileError::Transport(message.to_owned())));
    }

    pub(crate) fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().clone()
    }

    pub(crate) fn methods(&self) -> Vec<Method> {
        self.requests.lock().iter().map(|r| r.method.clone()).collect()
    }

    pub(crate) fn pending_responses(&self) -> usize {
        self.responses.lock().len()
    }
}

#[async_trait]
impl HttpTransport for MockTransport {
    async fn send(&self, request: Request<FeederBody>) -> UfileResult<Response<Bytes>> {
        let (parts, body) = request.into_parts();
        let body = body.collect().await?.to_bytes();

        self.requests.lock().push(RecordedRequest {
            method: parts.method,
            uri: parts.uri.to_string(),
            headers: parts.headers,
            body,
        });

        self.responses
            .lock()
            .pop_front()
            .unwrap_or_else(|| Err(UfileError::Transport("no scripted response".to_owned())))
    }
}

pub(crate) fn test_config() -> UfileConfig {
    UfileConfig::builder()
        .public_key("test-public-key".into())
        .private_key("test-private-key".into())
        .build()
}

pub(crate) fn test_signer() -> Signer {
    signer_for(&test_config())
}

pub(crate) fn signer_for(config: &UfileConfig) -> Signer {
    Signer::new(Arc::new(RustCryptoProvider), Arc::new(config.credentials()))
}

pub(crate) fn test_driver(mock: &Arc<MockTransport>) -> RequestDriver {
    driver_for(mock, &test_config())
}

pub(crate) fn driver_for(mock: &Arc<MockTransport>, config: &UfileConfig) -> RequestDriver {
    RequestDriver::new(signer_for(config), Arc::clone(mock) as Arc<dyn HttpTransport>)
}
