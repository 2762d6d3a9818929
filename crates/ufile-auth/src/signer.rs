//! UFile signature computation.
//!
//! Object requests are authorized with:
//!
//! ```text
//! Authorization: UCloud <PublicKey>:<Signature>
//! ```
//!
//! where `Signature = Base64(HMAC-SHA1(PrivateKey, StringToSign))` and the
//! string to sign comes from [`canonical_header_string`].
//!
//! [`canonical_header_string`]: crate::canonical::canonical_header_string

use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::debug;

use crate::canonical::{
    canonical_header_string, create_bucket_params, encode_query, query_string_to_sign,
};
use crate::credentials::CloudCredentials;
use crate::crypto::CryptoProvider;
use crate::error::SignError;

/// Size of the buffer the base64 signature is encoded into.
const SIGNATURE_BUF_LEN: usize = 64;

/// Compute `Base64(HMAC-SHA1(private_key, string_to_sign))`.
///
/// # Errors
///
/// Returns [`SignError::InvalidKey`] if `private_key` is empty and
/// [`SignError::EncodingError`] if the encoded digest does not fit the
/// signature buffer.
pub fn sign(
    crypto: &dyn CryptoProvider,
    string_to_sign: &str,
    private_key: &str,
) -> Result<String, SignError> {
    if private_key.is_empty() {
        return Err(SignError::InvalidKey);
    }

    let digest = crypto.hmac_sha1(private_key.as_bytes(), string_to_sign.as_bytes())?;

    let mut buf = [0u8; SIGNATURE_BUF_LEN];
    let written = crypto.base64_encode(&digest, &mut buf)?;
    let signature =
        std::str::from_utf8(&buf[..written]).map_err(|e| SignError::EncodingError(e.to_string()))?;

    Ok(signature.to_owned())
}

/// Assemble the `Authorization` header value.
///
/// # Examples
///
/// ```
/// use ufile_auth::authorization_header;
///
/// assert_eq!(authorization_header("pk", "c2ln"), "UCloud pk:c2ln");
/// ```
#[must_use]
pub fn authorization_header(public_key: &str, signature: &str) -> String {
    format!("UCloud {public_key}:{signature}")
}

/// Compute the lowercase hex SHA1 signature of a bucket management query.
#[must_use]
pub fn bucket_creation_signature(
    crypto: &dyn CryptoProvider,
    params: &BTreeMap<String, String>,
    private_key: &str,
) -> String {
    let string_to_sign = query_string_to_sign(params, private_key);
    hex::encode(crypto.sha1(string_to_sign.as_bytes()))
}

/// Signs requests for one set of credentials.
///
/// Cheap to clone; both fields are shared.
#[derive(Debug, Clone)]
pub struct Signer {
    crypto: Arc<dyn CryptoProvider>,
    credentials: Arc<CloudCredentials>,
}

impl Signer {
    /// Create a signer over the given crypto provider and credentials.
    #[must_use]
    pub fn new(crypto: Arc<dyn CryptoProvider>, credentials: Arc<CloudCredentials>) -> Self {
        Self {
            crypto,
            credentials,
        }
    }

    /// The credentials this signer uses.
    #[must_use]
    pub fn credentials(&self) -> &CloudCredentials {
        &self.credentials
    }

    /// Produce the `Authorization` header value for an object request.
    ///
    /// # Errors
    ///
    /// Propagates [`SignError`] from [`sign`].
    pub fn authorize(
        &self,
        method: &str,
        bucket: &str,
        key: &str,
        content_type: &str,
    ) -> Result<String, SignError> {
        let string_to_sign = canonical_header_string(method, bucket, key, content_type);
        debug!(string_to_sign = ?string_to_sign, "Built UFile string to sign");

        let signature = sign(
            self.crypto.as_ref(),
            &string_to_sign,
            &self.credentials.private_key,
        )?;
        Ok(authorization_header(&self.credentials.public_key, &signature))
    }

    /// Produce the full signed query string of a `CreateBucket` request,
    /// ending in `Signature=<hex>`.
    #[must_use]
    pub fn create_bucket_query(&self, bucket: &str) -> String {
        let params = create_bucket_params(
            bucket,
            &self.credentials.public_key,
            &self.credentials.bucket_region,
        );
        let signature =
            bucket_creation_signature(self.crypto.as_ref(), &params, &self.credentials.private_key);

        let mut query = encode_query(&params);
        query.push_str("Signature=");
        query.push_str(&signature);
        query
    }
}

#[cfg(test)]
mod tests {
    use base64::Engine;
    use base64::engine::general_purpose::STANDARD as BASE64;

    use super::*;
    use crate::crypto::{RustCryptoProvider, SHA1_DIGEST_LEN};

    fn test_signer() -> Signer {
        Signer::new(
            Arc::new(RustCryptoProvider),
            Arc::new(CloudCredentials {
                public_key: "pub/key+1".to_owned(),
                private_key: "private".to_owned(),
                domain_name: "cn-bj.ufileos.com".to_owned(),
                bucket_host: "api.ucloud.cn".to_owned(),
                bucket_region: "cn-bj".to_owned(),
                bucket_prefix: String::new(),
                dest_bucket: None,
            }),
        )
    }

    /// Provider whose encoder always reports an overflow.
    #[derive(Debug)]
    struct OverflowingProvider;

    impl CryptoProvider for OverflowingProvider {
        fn hmac_sha1(&self, key: &[u8], data: &[u8]) -> Result<[u8; SHA1_DIGEST_LEN], SignError> {
            RustCryptoProvider.hmac_sha1(key, data)
        }

        fn sha1(&self, data: &[u8]) -> [u8; SHA1_DIGEST_LEN] {
            RustCryptoProvider.sha1(data)
        }

        fn base64_encode(&self, input: &[u8], _output: &mut [u8]) -> Result<usize, SignError> {
            let mut tiny = [0u8; 1];
            RustCryptoProvider.base64_encode(input, &mut tiny)
        }
    }

    #[test]
    fn test_should_reject_empty_private_key() {
        let result = sign(&RustCryptoProvider, "PUT\n\n\n\n/b/k", "");
        assert_eq!(result, Err(SignError::InvalidKey));
    }

    #[test]
    fn test_should_sign_deterministically() {
        let a = sign(&RustCryptoProvider, "PUT\n\n\n\n/b/k", "secret").unwrap();
        let b = sign(&RustCryptoProvider, "PUT\n\n\n\n/b/k", "secret").unwrap();
        assert_eq!(a, b);
        // 20-byte digest encodes to 28 base64 characters.
        assert_eq!(a.len(), 28);
    }

    #[test]
    fn test_should_match_base64_of_hmac_sha1() {
        let digest = RustCryptoProvider.hmac_sha1(b"secret", b"data").unwrap();
        let expected = BASE64.encode(digest);
        assert_eq!(sign(&RustCryptoProvider, "data", "secret").unwrap(), expected);
    }

    #[test]
    fn test_should_surface_encoding_overflow() {
        let result = sign(&OverflowingProvider, "data", "secret");
        assert!(matches!(result, Err(SignError::EncodingError(_))));
    }

    #[test]
    fn test_should_build_authorization_header() {
        let signer = test_signer();
        let header = signer
            .authorize("PUT", "b", "k", "application/octet-stream")
            .unwrap();
        let expected_sig = sign(
            &RustCryptoProvider,
            "PUT\n\napplication/octet-stream\n\n/b/k",
            "private",
        )
        .unwrap();
        assert_eq!(header, format!("UCloud pub/key+1:{expected_sig}"));
    }

    #[test]
    fn test_should_hex_encode_bucket_signature_lowercase() {
        let params = BTreeMap::from([("a".to_owned(), "1".to_owned())]);
        let sig = bucket_creation_signature(&RustCryptoProvider, &params, "k");
        assert_eq!(sig, hex::encode(RustCryptoProvider.sha1(b"a1k")));
        assert_eq!(sig.len(), 40);
        assert!(sig.chars().all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c)));
    }

    #[test]
    fn test_should_build_signed_create_bucket_query() {
        let signer = test_signer();
        let query = signer.create_bucket_query("bkt");

        let unencoded = "ActionCreateBucketBucketNamebktPublicKeypub/key+1Regioncn-bjTypeprivateprivate";
        let expected_sig = hex::encode(RustCryptoProvider.sha1(unencoded.as_bytes()));
        assert_eq!(
            query,
            format!(
                "Action=CreateBucket&BucketName=bkt&PublicKey=pub%2Fkey%2B1&Region=cn-bj&Type=private&Signature={expected_sig}"
            )
        );
    }
}
