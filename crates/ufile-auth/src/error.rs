//! Error types for UFile request signing.

/// Errors that can occur while computing a UFile signature.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SignError {
    /// The private key used as the HMAC key is empty.
    #[error("signing key is empty")]
    InvalidKey,

    /// The base64 encoding of the digest did not fit its output buffer.
    #[error("signature encoding failed: {0}")]
    EncodingError(String),
}
