//! Single-object request driver.
//!
//! [`RequestDriver`] performs exactly one HTTP exchange per call. Each call
//! builds a fresh [`PendingRequest`] (URL, header set, body), applies the
//! signature, hands it to the [`HttpTransport`] and interprets the response.
//! Nothing is carried over between calls, so one driver can serve any number
//! of sequential operations.
//!
//! Object requests target `http://{bucket}.{domain}/{key}[?query]` and carry
//! exactly two headers: `Authorization` and
//! `Content-Type: application/octet-stream`. `CreateBucket` targets
//! `http://{bucket_host}/?...` and is signed in its query string.

use std::collections::BTreeMap;
use std::sync::Arc;

use bytes::Bytes;
use http::header::{AUTHORIZATION, CONTENT_TYPE, ETAG, HeaderName};
use http::{HeaderMap, HeaderValue, Method, Request, Response};
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use serde_json::Value;
use tracing::debug;
use ufile_auth::{CONTENT_TYPE_OCTET_STREAM, CloudCredentials, Signer};

use crate::body::{BufferList, FeederBody};
use crate::error::{UfileError, UfileResult};
use crate::transport::HttpTransport;

/// Characters left unencoded in object keys: unreserved characters and `/`.
const KEY_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~')
    .remove(b'/');

/// Result of a successful multipart initiation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InitiatedUpload {
    /// Upload identifier assigned by the service.
    pub upload_id: String,
    /// Part size the service expects, in bytes.
    pub block_size: u64,
}

/// One HTTP exchange being assembled.
#[derive(Debug)]
pub struct PendingRequest {
    method: Method,
    url: String,
    headers: HeaderMap,
    body: FeederBody,
}

impl PendingRequest {
    /// Start a request with no headers and an empty body.
    #[must_use]
    pub fn new(method: Method, url: String) -> Self {
        Self {
            method,
            url,
            headers: HeaderMap::new(),
            body: FeederBody::empty(),
        }
    }

    /// Append a header.
    ///
    /// # Errors
    ///
    /// Returns [`UfileError::InvalidRequest`] if `value` is not a valid header value.
    pub fn header(mut self, name: HeaderName, value: &str) -> UfileResult<Self> {
        let value = HeaderValue::from_str(value)
            .map_err(|e| UfileError::InvalidRequest(format!("header {name}: {e}")))?;
        self.headers.append(name, value);
        Ok(self)
    }

    /// Stream `length` bytes of `data` as the body.
    ///
    /// # Errors
    ///
    /// Returns [`UfileError::Body`] if the feeder rejects the body.
    pub fn body(mut self, data: BufferList, length: u64) -> UfileResult<Self> {
        self.body = FeederBody::streamed(data, length)?;
        Ok(self)
    }

    fn into_request(self) -> UfileResult<Request<FeederBody>> {
        let mut request = Request::builder()
            .method(self.method)
            .uri(&self.url)
            .body(self.body)
            .map_err(|e| UfileError::InvalidRequest(format!("{}: {e}", self.url)))?;
        *request.headers_mut() = self.headers;
        Ok(request)
    }
}

/// Executes signed UFile requests, one exchange per call.
#[derive(Debug, Clone)]
pub struct RequestDriver {
    signer: Signer,
    transport: Arc<dyn HttpTransport>,
}

impl RequestDriver {
    /// Create a driver that signs with `signer` and sends through `transport`.
    #[must_use]
    pub fn new(signer: Signer, transport: Arc<dyn HttpTransport>) -> Self {
        Self { signer, transport }
    }

    /// The credentials requests are signed with.
    #[must_use]
    pub fn credentials(&self) -> &CloudCredentials {
        self.signer.credentials()
    }

    /// Build the URL of an object request.
    ///
    /// The key is percent-encoded in the URL (keeping `/`) but signed verbatim.
    #[must_use]
    pub fn object_url(&self, bucket: &str, key: &str, query: Option<&str>) -> String {
        let key = utf8_percent_encode(key, KEY_ENCODE_SET);
        let domain = &self.credentials().domain_name;
        match query {
            Some(query) => format!("http://{bucket}.{domain}/{key}?{query}"),
            None => format!("http://{bucket}.{domain}/{key}"),
        }
    }

    /// Upload a whole object with one PUT.
    ///
    /// # Errors
    ///
    /// Returns [`UfileError::Status`] for a non-success response and passes
    /// signing, body and transport errors through.
    pub async fn put_object(
        &self,
        bucket: &str,
        key: &str,
        data: BufferList,
        length: u64,
    ) -> UfileResult<()> {
        debug!(bucket = %bucket, key = %key, length, "put object");
        let pending = self.signed(Method::PUT, bucket, key, None)?.body(data, length)?;
        self.execute(pending).await.map(|_| ())
    }

    /// Delete an object.
    ///
    /// # Errors
    ///
    /// See [`put_object`](Self::put_object).
    pub async fn delete_object(&self, bucket: &str, key: &str) -> UfileResult<()> {
        debug!(bucket = %bucket, key = %key, "delete object");
        let pending = self.signed(Method::DELETE, bucket, key, None)?;
        self.execute(pending).await.map(|_| ())
    }

    /// Create a private bucket in the configured region.
    ///
    /// # Errors
    ///
    /// See [`put_object`](Self::put_object).
    pub async fn create_bucket(&self, bucket: &str) -> UfileResult<()> {
        debug!(bucket = %bucket, "create bucket");
        let url = format!(
            "http://{}/?{}",
            self.credentials().bucket_host,
            self.signer.create_bucket_query(bucket)
        );
        self.execute(PendingRequest::new(Method::GET, url))
            .await
            .map(|_| ())
    }

    /// Start a multipart upload (`POST ?uploads`).
    ///
    /// # Errors
    ///
    /// A failed exchange returns [`UfileError::Status`] whose `ret_code` holds
    /// the parsed `RetCode`. A successful response without `UploadId` or
    /// `BlkSize` returns [`UfileError::MissingField`].
    pub async fn init_multipart(&self, bucket: &str, key: &str) -> UfileResult<InitiatedUpload> {
        debug!(bucket = %bucket, key = %key, "init multipart upload");
        let pending = self.signed(Method::POST, bucket, key, Some("uploads"))?;
        let response = self.execute(pending).await?;

        let document: Value = serde_json::from_slice(response.body())
            .map_err(|e| UfileError::InvalidResponse(e.to_string()))?;

        let upload_id = document
            .get("UploadId")
            .and_then(Value::as_str)
            .ok_or(UfileError::MissingField { field: "UploadId" })?
            .to_owned();
        let block_size = json_u64(&document, "BlkSize")
            .ok_or(UfileError::MissingField { field: "BlkSize" })?;

        debug!(upload_id = %upload_id, block_size, "multipart upload initiated");
        Ok(InitiatedUpload {
            upload_id,
            block_size,
        })
    }

    /// Upload one part and return its `ETag`.
    ///
    /// # Errors
    ///
    /// Returns [`UfileError::MissingETag`] if a successful response has no
    /// `ETag` header; otherwise see [`put_object`](Self::put_object).
    pub async fn upload_part(
        &self,
        bucket: &str,
        key: &str,
        upload_id: &str,
        part_number: u64,
        data: BufferList,
        length: u64,
    ) -> UfileResult<String> {
        debug!(bucket = %bucket, key = %key, upload_id = %upload_id, part_number, length, "upload part");
        let query = format!("uploadId={upload_id}&partNumber={part_number}");
        let pending = self
            .signed(Method::PUT, bucket, key, Some(&query))?
            .body(data, length)?;
        let response = self.execute(pending).await?;

        let etag = response
            .headers()
            .get(ETAG)
            .ok_or(UfileError::MissingETag)?
            .to_str()
            .map_err(|e| UfileError::InvalidResponse(format!("ETag header: {e}")))?;
        Ok(etag.to_owned())
    }

    /// Complete a multipart upload with the collected part ETags.
    ///
    /// The body is every ETag in ascending part-number order, joined by commas.
    ///
    /// # Errors
    ///
    /// Returns [`UfileError::NoParts`] without sending anything when `etags`
    /// is empty; otherwise see [`put_object`](Self::put_object).
    pub async fn finish_multipart(
        &self,
        bucket: &str,
        key: &str,
        upload_id: &str,
        etags: &BTreeMap<u64, String>,
    ) -> UfileResult<()> {
        if etags.is_empty() {
            return Err(UfileError::NoParts);
        }

        let body = etags.values().map(String::as_str).collect::<Vec<_>>().join(",");
        let length = body.len() as u64;
        debug!(bucket = %bucket, key = %key, upload_id = %upload_id, parts = etags.len(), "finish multipart upload");

        let query = format!("uploadId={upload_id}");
        let pending = self
            .signed(Method::POST, bucket, key, Some(&query))?
            .body(BufferList::from(body), length)?;
        self.execute(pending).await.map(|_| ())
    }

    /// Abort a multipart upload.
    ///
    /// # Errors
    ///
    /// See [`put_object`](Self::put_object).
    pub async fn abort_multipart(&self, bucket: &str, key: &str, upload_id: &str) -> UfileResult<()> {
        debug!(bucket = %bucket, key = %key, upload_id = %upload_id, "abort multipart upload");
        let query = format!("uploadId={upload_id}");
        let pending = self.signed(Method::DELETE, bucket, key, Some(&query))?;
        self.execute(pending).await.map(|_| ())
    }

    /// Start an object request carrying the two signed headers.
    fn signed(
        &self,
        method: Method,
        bucket: &str,
        key: &str,
        query: Option<&str>,
    ) -> UfileResult<PendingRequest> {
        let authorization =
            self.signer
                .authorize(method.as_str(), bucket, key, CONTENT_TYPE_OCTET_STREAM)?;
        let url = self.object_url(bucket, key, query);

        PendingRequest::new(method, url)
            .header(AUTHORIZATION, &authorization)?
            .header(CONTENT_TYPE, CONTENT_TYPE_OCTET_STREAM)
    }

    async fn execute(&self, pending: PendingRequest) -> UfileResult<Response<Bytes>> {
        let request = pending.into_request()?;
        let response = self.transport.send(request).await?;

        if response.status().is_success() {
            Ok(response)
        } else {
            Err(status_error(&response))
        }
    }
}

/// Turn a failed response into [`UfileError::Status`], best-effort parsing
/// `RetCode` and `ErrMsg` from a JSON body.
fn status_error(response: &Response<Bytes>) -> UfileError {
    let body = response.body();
    let document = serde_json::from_slice::<Value>(body).ok();

    let ret_code = document.as_ref().and_then(|d| json_i64(d, "RetCode"));
    let message = document
        .as_ref()
        .and_then(|d| d.get("ErrMsg"))
        .and_then(Value::as_str)
        .map_or_else(|| String::from_utf8_lossy(body).into_owned(), ToOwned::to_owned);

    UfileError::Status {
        status: response.status(),
        ret_code,
        message,
    }
}

/// Read an integer field given either as a JSON number or a numeric string.
fn json_i64(document: &Value, field: &str) -> Option<i64> {
    match document.get(field)? {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Unsigned variant of [`json_i64`].
fn json_u64(document: &Value, field: &str) -> Option<u64> {
    match document.get(field)? {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}
