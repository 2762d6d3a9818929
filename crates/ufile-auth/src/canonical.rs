//! String-to-sign construction for UFile requests.
//!
//! Object requests sign a fixed five-line string:
//!
//! ```text
//! HTTP-Verb + "\n" +
//! Content-MD5 + "\n" +        (always empty)
//! Content-Type + "\n" +
//! Date + "\n" +               (always empty)
//! "/" + Bucket + "/" + Key
//! ```
//!
//! No date or nonce is signed, so a given request always produces the same
//! signature.
//!
//! `CreateBucket` is signed over its query parameters instead. The parameters
//! are concatenated as `key + value` in lexicographic key order and the
//! private key is appended. In the URL the `PublicKey` value is
//! percent-encoded; in the string to sign it is not.

use std::collections::BTreeMap;

use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};

/// Content type sent (and signed) with every object request.
pub const CONTENT_TYPE_OCTET_STREAM: &str = "application/octet-stream";

/// Query parameter whose value is percent-encoded in the URL.
pub const PUBLIC_KEY_PARAM: &str = "PublicKey";

/// Unreserved characters (`A-Z a-z 0-9 - _ . ~`) stay as-is, everything else is encoded.
const QUERY_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// Build the string to sign for an object request.
///
/// # Examples
///
/// ```
/// use ufile_auth::canonical::canonical_header_string;
///
/// let s = canonical_header_string("PUT", "bucket", "dir/key", "application/octet-stream");
/// assert_eq!(s, "PUT\n\napplication/octet-stream\n\n/bucket/dir/key");
/// ```
#[must_use]
pub fn canonical_header_string(method: &str, bucket: &str, key: &str, content_type: &str) -> String {
    format!("{method}\n\n{content_type}\n\n/{bucket}/{key}")
}

/// Build the query parameters of a `CreateBucket` request.
///
/// A `BTreeMap` keeps them in the lexicographic order the signature relies on.
#[must_use]
pub fn create_bucket_params(
    bucket: &str,
    public_key: &str,
    region: &str,
) -> BTreeMap<String, String> {
    BTreeMap::from([
        ("Action".to_owned(), "CreateBucket".to_owned()),
        ("BucketName".to_owned(), bucket.to_owned()),
        (PUBLIC_KEY_PARAM.to_owned(), public_key.to_owned()),
        ("Region".to_owned(), region.to_owned()),
        ("Type".to_owned(), "private".to_owned()),
    ])
}

/// Concatenate `key + value` for every parameter, then append the private key.
///
/// # Examples
///
/// ```
/// use std::collections::BTreeMap;
/// use ufile_auth::canonical::query_string_to_sign;
///
/// let params = BTreeMap::from([
///     ("b".to_owned(), "2".to_owned()),
///     ("a".to_owned(), "1".to_owned()),
/// ]);
/// assert_eq!(query_string_to_sign(&params, "secret"), "a1b2secret");
/// ```
#[must_use]
pub fn query_string_to_sign(params: &BTreeMap<String, String>, private_key: &str) -> String {
    let mut result = String::new();
    for (key, value) in params {
        result.push_str(key);
        result.push_str(value);
    }
    result.push_str(private_key);
    result
}

/// Render the parameters as a URL query string, each pair followed by `&`.
///
/// Only `PublicKey` is percent-encoded; the trailing `&` lets the caller append
/// `Signature=...` directly.
#[must_use]
pub fn encode_query(params: &BTreeMap<String, String>) -> String {
    let mut query = String::new();
    for (key, value) in params {
        query.push_str(key);
        query.push('=');
        if key == PUBLIC_KEY_PARAM {
            query.extend(utf8_percent_encode(value, QUERY_ENCODE_SET));
        } else {
            query.push_str(value);
        }
        query.push('&');
    }
    query
}
