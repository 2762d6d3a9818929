//! UCloud UFile request signing.
//!
//! This crate implements the client side of the UFile authentication scheme.
//! Object requests carry an `Authorization` header of the form:
//!
//! ```text
//! UCloud <PublicKey>:<Base64(HMAC-SHA1(PrivateKey, StringToSign))>
//! ```
//!
//! Bucket management requests (only `CreateBucket` is used here) are signed in
//! the query string instead, with a lowercase hex SHA1 over the sorted
//! parameters followed by the private key.
//!
//! # Usage
//!
//! ```rust
//! use std::sync::Arc;
//!
//! use ufile_auth::{CloudCredentials, RustCryptoProvider, Signer};
//!
//! let credentials = CloudCredentials {
//!     public_key: "pub".to_owned(),
//!     private_key: "secret".to_owned(),
//!     domain_name: "cn-bj.ufileos.com".to_owned(),
//!     bucket_host: "api.ucloud.cn".to_owned(),
//!     bucket_region: "cn-bj".to_owned(),
//!     bucket_prefix: String::new(),
//!     dest_bucket: None,
//! };
//!
//! let signer = Signer::new(Arc::new(RustCryptoProvider), Arc::new(credentials));
//! let header = signer
//!     .authorize("PUT", "bucket", "key", "application/octet-stream")
//!     .unwrap();
//! assert!(header.starts_with("UCloud pub:"));
//! ```
//!
//! # Modules
//!
//! - [`canonical`] - String-to-sign construction for headers and bucket queries
//! - [`credentials`] - Immutable account and endpoint credentials
//! - [`crypto`] - Cryptographic provider trait and RustCrypto implementation
//! - [`error`] - Signing error types
//! - [`signer`] - Signature computation and `Authorization` header assembly

pub mod canonical;
pub mod credentials;
pub mod crypto;
pub mod error;
pub mod signer;

pub use canonical::{CONTENT_TYPE_OCTET_STREAM, canonical_header_string};
pub use credentials::CloudCredentials;
pub use crypto::{CryptoProvider, RustCryptoProvider};
pub use error::SignError;
pub use signer::{Signer, authorization_header, bucket_creation_signature, sign};
