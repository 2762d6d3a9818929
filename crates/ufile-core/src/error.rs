//! UFile client error types.
//!
//! [`UfileError`] covers every failure the tiering client can report. Failed
//! HTTP exchanges keep both the HTTP status and the `RetCode` parsed from the
//! JSON error body, so callers can tell a missing bucket (recoverable once)
//! apart from every other failure.
//!
//! ```
//! use http::StatusCode;
//! use ufile_core::error::UfileError;
//!
//! let err = UfileError::Status {
//!     status: StatusCode::BAD_REQUEST,
//!     ret_code: Some(-30010),
//!     message: "bucket not found".to_owned(),
//! };
//! assert_eq!(err.ret_code(), Some(-30010));
//! assert!(err.is_ret_code(-30010));
//! ```

use http::StatusCode;
use ufile_auth::SignError;

use crate::body::FeedError;

/// Errors produced by the UFile client.
#[derive(Debug, thiserror::Error)]
pub enum UfileError {
    // -----------------------------------------------------------------------
    // Transport errors
    // -----------------------------------------------------------------------
    /// The request could not be delivered (connection, DNS, I/O).
    #[error("transport error: {0}")]
    Transport(String),

    /// The remote answered with a non-success HTTP status.
    #[error("request failed with HTTP {status} (RetCode {ret_code:?}): {message}")]
    Status {
        /// HTTP status returned by the remote.
        status: StatusCode,
        /// `RetCode` parsed from the JSON error body, when present.
        ret_code: Option<i64>,
        /// `ErrMsg` from the error body, or the raw body.
        message: String,
    },

    // -----------------------------------------------------------------------
    // Protocol violations
    // -----------------------------------------------------------------------
    /// A successful response lacked a required JSON field.
    #[error("response is missing required field {field}")]
    MissingField {
        /// Name of the missing field.
        field: &'static str,
    },

    /// A successful part upload returned no `ETag` header.
    #[error("part upload response has no ETag header")]
    MissingETag,

    /// A successful response body could not be parsed.
    #[error("invalid response body: {0}")]
    InvalidResponse(String),

    // -----------------------------------------------------------------------
    // Invalid arguments
    // -----------------------------------------------------------------------
    /// A multipart upload was finished without any uploaded part.
    #[error("multipart upload has no parts")]
    NoParts,

    /// No multipart upload is in progress for the given object.
    #[error("no multipart upload in progress for {bucket}/{key}")]
    NoActiveUpload {
        /// Gateway bucket name.
        bucket: String,
        /// Object key.
        key: String,
    },

    /// The request could not be built (invalid URI or header value).
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// The request body could not be streamed.
    #[error("body error: {0}")]
    Body(#[from] FeedError),

    /// The request could not be signed.
    #[error("signing error: {0}")]
    Sign(#[from] SignError),

    /// The client configuration is incomplete.
    #[error("configuration error: {0}")]
    Config(String),
}

impl UfileError {
    /// The remote `RetCode`, if this is a failed exchange that carried one.
    #[must_use]
    pub fn ret_code(&self) -> Option<i64> {
        match self {
            Self::Status { ret_code, .. } => *ret_code,
            _ => None,
        }
    }

    /// Whether the remote reported exactly `code` as its `RetCode`.
    #[must_use]
    pub fn is_ret_code(&self, code: i64) -> bool {
        self.ret_code() == Some(code)
    }

    /// The HTTP status of a failed exchange.
    #[must_use]
    pub fn status_code(&self) -> Option<StatusCode> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Convenience result type for UFile operations.
pub type UfileResult<T> = Result<T, UfileError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_should_expose_ret_code_only_for_status_errors() {
        let err = UfileError::Status {
            status: StatusCode::NOT_FOUND,
            ret_code: None,
            message: String::new(),
        };
        assert_eq!(err.ret_code(), None);
        assert_eq!(err.status_code(), Some(StatusCode::NOT_FOUND));

        assert_eq!(UfileError::Transport("refused".into()).ret_code(), None);
        assert!(!UfileError::NoParts.is_ret_code(0));
    }

    #[test]
    fn test_should_convert_sign_error() {
        let err: UfileError = SignError::InvalidKey.into();
        assert!(matches!(err, UfileError::Sign(SignError::InvalidKey)));
        assert_eq!(err.to_string(), "signing error: signing key is empty");
    }

    #[test]
    fn test_should_format_status_error() {
        let err = UfileError::Status {
            status: StatusCode::BAD_REQUEST,
            ret_code: Some(-30010),
            message: "no such bucket".to_owned(),
        };
        assert_eq!(
            err.to_string(),
            "request failed with HTTP 400 Bad Request (RetCode Some(-30010)): no such bucket"
        );
    }
}
