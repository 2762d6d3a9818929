//! UFile client configuration.
//!
//! Provides [`UfileConfig`] for configuring the tiering client. Values are
//! loaded from environment variables by [`UfileConfig::from_env`] and turned
//! into the immutable [`CloudCredentials`] shared by every request.

use serde::{Deserialize, Serialize};
use typed_builder::TypedBuilder;
use ufile_auth::CloudCredentials;

use crate::error::{UfileError, UfileResult};

/// `RetCode` the service returns when the target bucket does not exist.
pub const BUCKET_NOT_EXIST_RET_CODE: i64 = -30010;

/// UFile client configuration.
///
/// # Examples
///
/// ```
/// use ufile_core::config::UfileConfig;
///
/// let config = UfileConfig::default();
/// assert_eq!(config.domain_name, "cn-bj.ufileos.com");
/// assert_eq!(config.bucket_not_exist_code, -30010);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, TypedBuilder)]
#[serde(rename_all = "camelCase")]
pub struct UfileConfig {
    /// Account public key.
    #[builder(default)]
    pub public_key: String,

    /// Account private key. Never serialized.
    #[builder(default)]
    #[serde(skip_serializing, default)]
    pub private_key: String,

    /// Object endpoint domain (objects live at `{bucket}.{domain}`).
    #[builder(default = String::from("cn-bj.ufileos.com"))]
    pub domain_name: String,

    /// Host of the bucket management API.
    #[builder(default = String::from("api.ucloud.cn"))]
    pub bucket_host: String,

    /// Region for auto-created buckets.
    #[builder(default = String::from("cn-bj"))]
    pub bucket_region: String,

    /// Prefix prepended to every destination bucket.
    #[builder(default)]
    pub bucket_prefix: String,

    /// Bucket that replaces the gateway's bucket name.
    #[builder(default)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dest_bucket: Option<String>,

    /// `RetCode` that triggers bucket auto-creation.
    #[builder(default = BUCKET_NOT_EXIST_RET_CODE)]
    pub bucket_not_exist_code: i64,

    /// Log level filter string (e.g. `"info"`, `"debug"`).
    #[builder(default = String::from("info"))]
    pub log_level: String,
}

impl Default for UfileConfig {
    fn default() -> Self {
        Self {
            public_key: String::new(),
            private_key: String::new(),
            domain_name: String::from("cn-bj.ufileos.com"),
            bucket_host: String::from("api.ucloud.cn"),
            bucket_region: String::from("cn-bj"),
            bucket_prefix: String::new(),
            dest_bucket: None,
            bucket_not_exist_code: BUCKET_NOT_EXIST_RET_CODE,
            log_level: String::from("info"),
        }
    }
}

impl UfileConfig {
    /// Load configuration from environment variables.
    ///
    /// Reads the following environment variables (falling back to defaults):
    ///
    /// | Variable | Default |
    /// |----------|---------|
    /// | `UFILE_PUBLIC_KEY` | *(empty)* |
    /// | `UFILE_PRIVATE_KEY` | *(empty)* |
    /// | `UFILE_DOMAIN` | `cn-bj.ufileos.com` |
    /// | `UFILE_BUCKET_HOST` | `api.ucloud.cn` |
    /// | `UFILE_REGION` | `cn-bj` |
    /// | `UFILE_BUCKET_PREFIX` | *(empty)* |
    /// | `UFILE_DEST_BUCKET` | *(unset)* |
    /// | `UFILE_BUCKET_NOT_EXIST_CODE` | `-30010` |
    /// | `UFILE_LOG_LEVEL` | `info` |
    #[must_use]
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(v) = std::env::var("UFILE_PUBLIC_KEY") {
            config.public_key = v;
        }
        if let Ok(v) = std::env::var("UFILE_PRIVATE_KEY") {
            config.private_key = v;
        }
        if let Ok(v) = std::env::var("UFILE_DOMAIN") {
            config.domain_name = v;
        }
        if let Ok(v) = std::env::var("UFILE_BUCKET_HOST") {
            config.bucket_host = v;
        }
        if let Ok(v) = std::env::var("UFILE_REGION") {
            config.bucket_region = v;
        }
        if let Ok(v) = std::env::var("UFILE_BUCKET_PREFIX") {
            config.bucket_prefix = v;
        }
        if let Ok(v) = std::env::var("UFILE_DEST_BUCKET") {
            config.dest_bucket = non_empty(v);
        }
        if let Ok(v) = std::env::var("UFILE_BUCKET_NOT_EXIST_CODE") {
            if let Ok(n) = v.trim().parse::<i64>() {
                config.bucket_not_exist_code = n;
            }
        }
        if let Ok(v) = std::env::var("UFILE_LOG_LEVEL") {
            config.log_level = v;
        }

        config
    }

    /// Check that the settings needed to sign and route requests are present.
    ///
    /// # Errors
    ///
    /// Returns [`UfileError::Config`] naming the first missing setting.
    pub fn validate(&self) -> UfileResult<()> {
        let required = [
            ("public key", &self.public_key),
            ("private key", &self.private_key),
            ("domain name", &self.domain_name),
            ("bucket host", &self.bucket_host),
        ];
        for (name, value) in required {
            if value.trim().is_empty() {
                return Err(UfileError::Config(format!("{name} is not set")));
            }
        }
        Ok(())
    }

    /// Build the credentials shared by every request.
    #[must_use]
    pub fn credentials(&self) -> CloudCredentials {
        CloudCredentials {
            public_key: self.public_key.clone(),
            private_key: self.private_key.clone(),
            domain_name: self.domain_name.clone(),
            bucket_host: self.bucket_host.clone(),
            bucket_region: self.bucket_region.clone(),
            bucket_prefix: self.bucket_prefix.clone(),
            dest_bucket: self.dest_bucket.clone().and_then(non_empty),
        }
    }

    /// The bucket objects for `bucket` are written to: the prefix followed by
    /// the override bucket when set, otherwise `bucket`.
    #[must_use]
    pub fn effective_bucket(&self, bucket: &str) -> String {
        self.credentials().effective_bucket(bucket)
    }
}

fn non_empty(value: String) -> Option<String> {
    if value.is_empty() { None } else { Some(value) }
}
