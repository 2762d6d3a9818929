//! Account and endpoint credentials shared by every request of a session.

use std::fmt;

/// Credentials and endpoint settings for one UFile account.
///
/// Immutable once built; requests borrow it through an `Arc`.
#[derive(Clone, PartialEq, Eq)]
pub struct CloudCredentials {
    /// Public (access) key, sent in the clear in every signature.
    pub public_key: String,
    /// Private key used as the HMAC key. Never logged.
    pub private_key: String,
    /// Object endpoint domain; objects live at `{bucket}.{domain_name}`.
    pub domain_name: String,
    /// Host of the bucket management API (used for `CreateBucket`).
    pub bucket_host: String,
    /// Region in which auto-created buckets are placed.
    pub bucket_region: String,
    /// Prefix prepended to every destination bucket name.
    pub bucket_prefix: String,
    /// Optional bucket that replaces the gateway's bucket name.
    pub dest_bucket: Option<String>,
}

impl CloudCredentials {
    /// Resolve the remote bucket for a gateway bucket.
    ///
    /// The destination override (when set and non-empty) replaces `bucket`,
    /// then the prefix is prepended.
    ///
    /// # Examples
    ///
    /// ```
    /// use ufile_auth::CloudCredentials;
    ///
    /// let mut creds = CloudCredentials {
    ///     public_key: "pk".to_owned(),
    ///     private_key: "sk".to_owned(),
    ///     domain_name: "ufileos.com".to_owned(),
    ///     bucket_host: "api.ucloud.cn".to_owned(),
    ///     bucket_region: "cn-bj".to_owned(),
    ///     bucket_prefix: "tier-".to_owned(),
    ///     dest_bucket: None,
    /// };
    /// assert_eq!(creds.effective_bucket("photos"), "tier-photos");
    ///
    /// creds.dest_bucket = Some("archive".to_owned());
    /// assert_eq!(creds.effective_bucket("photos"), "tier-archive");
    /// ```
    #[must_use]
    pub fn effective_bucket(&self, bucket: &str) -> String {
        let target = match self.dest_bucket.as_deref() {
            Some(dest) if !dest.is_empty() => dest,
            _ => bucket,
        };
        format!("{}{target}", self.bucket_prefix)
    }
}

impl fmt::Debug for CloudCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CloudCredentials")
            .field("public_key", &self.public_key)
            .field("private_key", &"<redacted>")
            .field("domain_name", &self.domain_name)
            .field("bucket_host", &self.bucket_host)
            .field("bucket_region", &self.bucket_region)
            .field("bucket_prefix", &self.bucket_prefix)
            .field("dest_bucket", &self.dest_bucket)
            .finish()
    }
}
