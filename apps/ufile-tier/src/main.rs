//! UFile Tier - copy local files to UCloud UFile and delete tiered objects.
//!
//! Small files are uploaded with one PUT. Larger files go through a
//! multipart upload split at the block size the service asks for. A missing
//! destination bucket is created on the fly.
//!
//! # Usage
//!
//! ```text
//! ufile-tier put <bucket> <key> <file>
//! ufile-tier delete <bucket> <key>
//! ```
//!
//! # Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `UFILE_PUBLIC_KEY` | *(required)* | Account public key |
//! | `UFILE_PRIVATE_KEY` | *(required)* | Account private key |
//! | `UFILE_DOMAIN` | `cn-bj.ufileos.com` | Object endpoint domain |
//! | `UFILE_BUCKET_HOST` | `api.ucloud.cn` | Bucket management host |
//! | `UFILE_REGION` | `cn-bj` | Region for created buckets |
//! | `UFILE_BUCKET_PREFIX` | *(empty)* | Prefix for every destination bucket |
//! | `UFILE_DEST_BUCKET` | *(unset)* | Bucket that replaces the given one |
//! | `UFILE_MULTIPART_THRESHOLD` | `4194304` | Files at least this large use multipart |
//! | `UFILE_LOG_LEVEL` | `info` | Log level filter |
//! | `RUST_LOG` | *(unset)* | Fine-grained tracing filter (overrides `UFILE_LOG_LEVEL`) |

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use bytes::Bytes;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;
use ufile_core::{BufferList, UfileCloud, UfileConfig};

/// Size below which a file is sent with a single PUT.
const DEFAULT_MULTIPART_THRESHOLD: u64 = 4 * 1024 * 1024;

const USAGE: &str = "usage: ufile-tier put <bucket> <key> <file> | ufile-tier delete <bucket> <key>";

/// Initialize the tracing subscriber.
///
/// Uses `RUST_LOG` if set, otherwise falls back to the `UFILE_LOG_LEVEL` config value.
fn init_tracing(log_level: &str) -> Result<()> {
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else {
        EnvFilter::try_new(log_level)
            .with_context(|| format!("invalid log level filter: {log_level}"))?
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .init();

    Ok(())
}

#[derive(Debug)]
enum Command {
    Put {
        bucket: String,
        key: String,
        file: PathBuf,
    },
    Delete {
        bucket: String,
        key: String,
    },
}

impl Command {
    fn parse(args: &[String]) -> Result<Self> {
        match args {
            [cmd, bucket, key, file] if cmd == "put" => Ok(Self::Put {
                bucket: bucket.clone(),
                key: key.clone(),
                file: PathBuf::from(file),
            }),
            [cmd, bucket, key] if cmd == "delete" => Ok(Self::Delete {
                bucket: bucket.clone(),
                key: key.clone(),
            }),
            _ => bail!(USAGE),
        }
    }
}

fn multipart_threshold() -> u64 {
    std::env::var("UFILE_MULTIPART_THRESHOLD")
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(DEFAULT_MULTIPART_THRESHOLD)
}

/// Whether a file of `size` bytes goes out as one PUT. Empty files always do:
/// a multipart upload needs at least one part.
fn is_single_put(size: u64, threshold: u64) -> bool {
    size == 0 || size < threshold
}

/// Split `data` into consecutive parts of at most `block_size` bytes. A zero
/// block size yields one part.
fn split_parts(data: &Bytes, block_size: u64) -> Vec<Bytes> {
    if block_size == 0 {
        return vec![data.clone()];
    }
    let block_size = usize::try_from(block_size).unwrap_or(usize::MAX);
    (0..data.len())
        .step_by(block_size)
        .map(|start| data.slice(start..data.len().min(start + block_size)))
        .collect()
}

async fn upload_file(cloud: &mut UfileCloud, bucket: &str, key: &str, file: &Path) -> Result<()> {
    let data = Bytes::from(
        tokio::fs::read(file)
            .await
            .with_context(|| format!("cannot read {}", file.display()))?,
    );
    let size = data.len() as u64;

    if is_single_put(size, multipart_threshold()) {
        info!(bucket = %bucket, key = %key, size, "uploading with a single PUT");
        cloud
            .put_object(bucket, key, BufferList::from(data), size)
            .await
            .with_context(|| format!("failed to upload {key}"))?;
        return Ok(());
    }

    cloud
        .begin_multipart(bucket, key)
        .await
        .with_context(|| format!("failed to start multipart upload of {key}"))?;
    let block_size = cloud.session().map_or(0, |s| s.block_size());
    let parts = split_parts(&data, block_size);
    info!(bucket = %bucket, key = %key, size, block_size, parts = parts.len(), "uploading in parts");

    for part in parts {
        let length = part.len() as u64;
        if let Err(e) = cloud
            .upload_part(bucket, key, BufferList::from(part), length)
            .await
        {
            if let Err(abort_err) = cloud.abort_multipart(bucket, key).await {
                warn!(error = %abort_err, "failed to abort multipart upload");
            }
            return Err(e).with_context(|| format!("failed to upload a part of {key}"));
        }
    }

    cloud
        .finish_multipart(bucket, key)
        .await
        .with_context(|| format!("failed to complete multipart upload of {key}"))
}

async fn run(command: Command, config: &UfileConfig) -> Result<()> {
    let mut cloud = UfileCloud::from_config(config).context("invalid UFile configuration")?;

    match command {
        Command::Put { bucket, key, file } => {
            info!(
                file = %file.display(),
                dest_bucket = %config.effective_bucket(&bucket),
                key = %key,
                "tiering file"
            );
            upload_file(&mut cloud, &bucket, &key, &file).await
        }
        Command::Delete { bucket, key } => cloud
            .remove_object(&bucket, &key)
            .await
            .with_context(|| format!("failed to delete {key}")),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let config = UfileConfig::from_env();
    init_tracing(&config.log_level)?;

    let args: Vec<String> = std::env::args().skip(1).collect();
    let command = Command::parse(&args)?;

    info!(
        domain = %config.domain_name,
        region = %config.bucket_region,
        public_key = %config.public_key,
        "starting ufile-tier",
    );

    if let Err(e) = run(command, &config).await {
        error!(error = %format!("{e:#}"), "ufile-tier failed");
        return Err(e);
    }
    Ok(())
}
