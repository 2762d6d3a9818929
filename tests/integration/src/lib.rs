//! Integration tests for the UFile tiering client.
//!
//! These tests talk to a real UFile endpoint and need `UFILE_PUBLIC_KEY`,
//! `UFILE_PRIVATE_KEY` and optionally `UFILE_DOMAIN`, `UFILE_BUCKET_HOST`,
//! `UFILE_REGION` and `UFILE_TEST_BUCKET`. They are marked `#[ignore]` so
//! they don't run during normal `cargo test`.
//!
//! Run them with:
//! ```text
//! cargo test -p ufile-integration -- --ignored
//! ```

use std::sync::Once;

use ufile_core::{UfileCloud, UfileConfig};

static INIT: Once = Once::new();

/// Initialize tracing (once).
fn init_tracing() {
    INIT.call_once(|| {
        tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
            )
            .with_test_writer()
            .init();
    });
}

/// Bucket the tests write to.
#[must_use]
pub fn test_bucket() -> String {
    std::env::var("UFILE_TEST_BUCKET").unwrap_or_else(|_| "ufile-tier-it".to_owned())
}

/// Generate a unique object key for a test.
#[must_use]
pub fn test_key(prefix: &str) -> String {
    let id = uuid::Uuid::new_v4().to_string()[..8].to_owned();
    format!("test-{prefix}-{id}")
}

/// Generate a unique bucket name for a test that needs a fresh bucket.
#[must_use]
pub fn test_bucket_name(prefix: &str) -> String {
    let id = uuid::Uuid::new_v4().to_string()[..8].to_owned();
    format!("it-{prefix}-{id}")
}

/// Create a client configured from the environment.
#[must_use]
pub fn ufile_client() -> UfileCloud {
    init_tracing();

    let config = UfileConfig::from_env();
    UfileCloud::from_config(&config)
        .unwrap_or_else(|e| panic!("UFile credentials are not configured: {e}"))
}

mod test_multipart;
mod test_object;
