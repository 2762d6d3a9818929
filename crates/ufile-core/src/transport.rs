//! HTTP transport used by the request driver.
//!
//! The driver only needs one capability: send a fully built request and get
//! the response back with its body collected. [`HttpTransport`] captures that
//! so the driver can run over hyper in production and over a scripted
//! transport in tests. Timeouts, TLS and connection pooling are the
//! transport's business.

use std::fmt;

use async_trait::async_trait;
use bytes::Bytes;
use http::{Request, Response};
use http_body_util::BodyExt;
use hyper_util::client::legacy::Client;
use hyper_util::client::legacy::connect::HttpConnector;
use hyper_util::rt::TokioExecutor;
use tracing::trace;

use crate::body::FeederBody;
use crate::error::{UfileError, UfileResult};

/// Sends one HTTP exchange.
///
/// Uses `#[async_trait]` so the driver can hold an `Arc<dyn HttpTransport>`.
#[async_trait]
pub trait HttpTransport: Send + Sync + fmt::Debug {
    /// Send `request` and return the response with its body fully read.
    ///
    /// Non-success statuses are returned as responses, not errors.
    ///
    /// # Errors
    ///
    /// Returns [`UfileError::Transport`] if the exchange could not complete.
    async fn send(&self, request: Request<FeederBody>) -> UfileResult<Response<Bytes>>;
}

/// [`HttpTransport`] over a pooled hyper client.
#[derive(Debug, Clone)]
pub struct HyperTransport {
    client: Client<HttpConnector, FeederBody>,
}

impl HyperTransport {
    /// Create a transport with a plain-HTTP connector.
    #[must_use]
    pub fn new() -> Self {
        let mut connector = HttpConnector::new();
        connector.set_nodelay(true);

        let client = Client::builder(TokioExecutor::new()).build(connector);
        Self { client }
    }
}

impl Default for HyperTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl HttpTransport for HyperTransport {
    async fn send(&self, request: Request<FeederBody>) -> UfileResult<Response<Bytes>> {
        trace!(method = %request.method(), uri = %request.uri(), "sending request");

        let response = self
            .client
            .request(request)
            .await
            .map_err(|e| UfileError::Transport(e.to_string()))?;

        let (parts, body) = response.into_parts();
        let body = body
            .collect()
            .await
            .map_err(|e| UfileError::Transport(e.to_string()))?
            .to_bytes();

        trace!(status = %parts.status, len = body.len(), "received response");
        Ok(Response::from_parts(parts, body))
    }
}
