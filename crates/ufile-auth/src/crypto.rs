//! Cryptographic provider trait and implementations.
//!
//! The signer never reaches for a process-wide crypto context. Callers hand it
//! a [`CryptoProvider`], which makes the primitives swappable (for example a
//! FIPS-backed provider) and keeps signing deterministic under test.

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use digest::KeyInit;
use hmac::{Hmac, Mac};
use sha1::{Digest, Sha1};

use crate::error::SignError;

/// Size in bytes of a SHA1 (and HMAC-SHA1) digest.
pub const SHA1_DIGEST_LEN: usize = 20;

type HmacSha1 = Hmac<Sha1>;

/// Primitives required to sign UFile requests.
pub trait CryptoProvider: Send + Sync + std::fmt::Debug {
    /// Compute HMAC-SHA1 of `data` keyed with `key`.
    ///
    /// # Errors
    ///
    /// Returns [`SignError::InvalidKey`] if the key is rejected by the MAC.
    fn hmac_sha1(&self, key: &[u8], data: &[u8]) -> Result<[u8; SHA1_DIGEST_LEN], SignError>;

    /// Compute the SHA1 digest of `data`.
    fn sha1(&self, data: &[u8]) -> [u8; SHA1_DIGEST_LEN];

    /// Base64-encode `input` into `output`, returning the number of bytes written.
    ///
    /// # Errors
    ///
    /// Returns [`SignError::EncodingError`] if `output` is too small.
    fn base64_encode(&self, input: &[u8], output: &mut [u8]) -> Result<usize, SignError>;
}

/// [`CryptoProvider`] backed by the RustCrypto `hmac`/`sha1` crates and `base64`.
#[derive(Debug, Clone, Copy, Default)]
pub struct RustCryptoProvider;

impl CryptoProvider for RustCryptoProvider {
    fn hmac_sha1(&self, key: &[u8], data: &[u8]) -> Result<[u8; SHA1_DIGEST_LEN], SignError> {
        let mut mac =
            <HmacSha1 as KeyInit>::new_from_slice(key).map_err(|_| SignError::InvalidKey)?;
        mac.update(data);
        let result = mac.finalize().into_bytes();

        let mut digest = [0u8; SHA1_DIGEST_LEN];
        digest.copy_from_slice(&result);
        Ok(digest)
    }

    fn sha1(&self, data: &[u8]) -> [u8; SHA1_DIGEST_LEN] {
        let result = Sha1::digest(data);

        let mut digest = [0u8; SHA1_DIGEST_LEN];
        digest.copy_from_slice(&result);
        digest
    }

    fn base64_encode(&self, input: &[u8], output: &mut [u8]) -> Result<usize, SignError> {
        BASE64
            .encode_slice(input, output)
            .map_err(|e| SignError::EncodingError(e.to_string()))
    }
}
