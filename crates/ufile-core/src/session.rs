//! Multipart transfer session state.
//!
//! A [`TransferSession`] is created when a multipart upload is initiated and
//! tracks the server-assigned upload id, the next caller-assigned part number
//! and the `ETag` of every successfully uploaded part. Parts are kept in a
//! [`BTreeMap`] so completion always lists them in ascending part-number
//! order.

use std::collections::BTreeMap;
use std::fmt;

use tracing::debug;

use crate::request::InitiatedUpload;

/// Lifecycle of a [`TransferSession`].
///
/// ```text
/// Uninitialized -> Initiating -> Active -> Finishing -> Completed
///                   |    ^                     |
///                   v    |                     v
///          BucketMissing -> CreatingBucket   Aborting -> Aborted
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Created, nothing sent yet.
    Uninitialized,
    /// Multipart initiation in flight.
    Initiating,
    /// Initiation reported that the bucket does not exist.
    BucketMissing,
    /// Bucket creation in flight.
    CreatingBucket,
    /// Accepting parts.
    Active,
    /// Completion in flight.
    Finishing,
    /// The object was assembled.
    Completed,
    /// Abort in flight, or an abort that failed.
    Aborting,
    /// The upload was discarded.
    Aborted,
}

impl SessionState {
    /// Whether the session can no longer change.
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Aborted)
    }

    fn as_str(self) -> &'static str {
        match self {
            Self::Uninitialized => "uninitialized",
            Self::Initiating => "initiating",
            Self::BucketMissing => "bucket-missing",
            Self::CreatingBucket => "creating-bucket",
            Self::Active => "active",
            Self::Finishing => "finishing",
            Self::Completed => "completed",
            Self::Aborting => "aborting",
            Self::Aborted => "aborted",
        }
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One multipart upload in progress.
#[derive(Debug, Clone)]
pub struct TransferSession {
    bucket: String,
    key: String,
    upload_id: String,
    block_size: u64,
    next_part_number: u64,
    parts: BTreeMap<u64, String>,
    state: SessionState,
}

impl TransferSession {
    /// Create an uninitialized session for `key` in the (effective) `bucket`.
    #[must_use]
    pub fn new(bucket: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            key: key.into(),
            upload_id: String::new(),
            block_size: 0,
            next_part_number: 1,
            parts: BTreeMap::new(),
            state: SessionState::Uninitialized,
        }
    }

    /// Bucket the upload writes to, after override and prefix.
    #[must_use]
    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    /// Object key.
    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Server-assigned upload id; empty until the session is active.
    #[must_use]
    pub fn upload_id(&self) -> &str {
        &self.upload_id
    }

    /// Part size suggested by the service.
    #[must_use]
    pub fn block_size(&self) -> u64 {
        self.block_size
    }

    /// Number the next uploaded part will carry.
    #[must_use]
    pub fn next_part_number(&self) -> u64 {
        self.next_part_number
    }

    /// `ETag`s of the uploaded parts, by part number.
    #[must_use]
    pub fn parts(&self) -> &BTreeMap<u64, String> {
        &self.parts
    }

    /// Current lifecycle state.
    #[must_use]
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Whether the session accepts parts.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.state == SessionState::Active
    }

    pub(crate) fn transition(&mut self, next: SessionState) {
        debug!(
            bucket = %self.bucket,
            key = %self.key,
            from = %self.state,
            to = %next,
            "session state change"
        );
        self.state = next;
        if next.is_terminal() {
            self.parts.clear();
        }
    }

    pub(crate) fn activate(&mut self, upload: InitiatedUpload) {
        self.upload_id = upload.upload_id;
        self.block_size = upload.block_size;
        self.transition(SessionState::Active);
    }

    /// Claim the next part number. The slot is consumed whether or not the
    /// upload using it succeeds.
    pub(crate) fn take_part_number(&mut self) -> u64 {
        let part_number = self.next_part_number;
        self.next_part_number += 1;
        part_number
    }

    pub(crate) fn record_part(&mut self, part_number: u64, etag: String) {
        self.parts.insert(part_number, etag);
    }
}
