//! Multipart transfer state machine.
//!
//! [`MultipartTransfer`] sequences the driver calls that make up a transfer:
//! initiate, upload parts one by one, then finish or abort. Two recovery
//! rules apply:
//!
//! - When initiation (or a single-shot PUT) fails with the bucket-missing
//!   `RetCode`, the bucket is created and the step retried exactly once.
//! - When completion fails, the upload is aborted on a best-effort basis and
//!   the completion error is returned.
//!
//! Nothing else is retried.

use tracing::{debug, info, warn};

use crate::body::BufferList;
use crate::error::{UfileError, UfileResult};
use crate::request::RequestDriver;
use crate::session::{SessionState, TransferSession};

/// Drives multipart transfers and bucket-recovering single-shot uploads.
#[derive(Debug, Clone)]
pub struct MultipartTransfer {
    driver: RequestDriver,
    bucket_not_exist_code: i64,
}

impl MultipartTransfer {
    /// Create a state machine over `driver`. `bucket_not_exist_code` is the
    /// `RetCode` that triggers bucket creation.
    #[must_use]
    pub fn new(driver: RequestDriver, bucket_not_exist_code: i64) -> Self {
        Self {
            driver,
            bucket_not_exist_code,
        }
    }

    /// The underlying request driver.
    #[must_use]
    pub fn driver(&self) -> &RequestDriver {
        &self.driver
    }

    /// The bucket a gateway bucket maps to.
    #[must_use]
    pub fn effective_bucket(&self, bucket: &str) -> String {
        self.driver.credentials().effective_bucket(bucket)
    }

    /// Initiate a multipart upload of `key`.
    ///
    /// # Errors
    ///
    /// Returns the initiation error unchanged unless it carries the
    /// bucket-missing `RetCode`. In that case the bucket is created and
    /// initiation retried once; a failed creation or a second failed
    /// initiation is returned as is.
    pub async fn begin(&self, bucket: &str, key: &str) -> UfileResult<TransferSession> {
        let bucket = self.effective_bucket(bucket);
        let mut session = TransferSession::new(bucket.clone(), key);

        session.transition(SessionState::Initiating);
        let upload = match self.driver.init_multipart(&bucket, key).await {
            Ok(upload) => upload,
            Err(e) if e.is_ret_code(self.bucket_not_exist_code) => {
                session.transition(SessionState::BucketMissing);
                warn!(bucket = %bucket, "bucket does not exist, creating it");

                session.transition(SessionState::CreatingBucket);
                self.driver.create_bucket(&bucket).await?;

                session.transition(SessionState::Initiating);
                self.driver.init_multipart(&bucket, key).await?
            }
            Err(e) => return Err(e),
        };

        session.activate(upload);
        info!(
            bucket = %bucket,
            key = %key,
            upload_id = %session.upload_id(),
            block_size = session.block_size(),
            "multipart upload started"
        );
        Ok(session)
    }

    /// Upload the next part of `session` and return its `ETag`.
    ///
    /// The part number is consumed even when the upload fails; failed parts
    /// are not retried and leave no entry in the part map.
    ///
    /// # Errors
    ///
    /// Returns [`UfileError::NoActiveUpload`] if the session does not accept
    /// parts, otherwise the driver error.
    pub async fn upload_part(
        &self,
        session: &mut TransferSession,
        data: BufferList,
        length: u64,
    ) -> UfileResult<String> {
        ensure_active(session)?;

        let part_number = session.take_part_number();
        let result = self
            .driver
            .upload_part(
                session.bucket(),
                session.key(),
                session.upload_id(),
                part_number,
                data,
                length,
            )
            .await;

        match result {
            Ok(etag) => {
                debug!(part_number, etag = %etag, "part uploaded");
                session.record_part(part_number, etag.clone());
                Ok(etag)
            }
            Err(e) => {
                warn!(
                    upload_id = %session.upload_id(),
                    part_number,
                    error = %e,
                    "part upload failed"
                );
                Err(e)
            }
        }
    }

    /// Complete `session`.
    ///
    /// # Errors
    ///
    /// Returns [`UfileError::NoParts`] without any network call when no part
    /// was uploaded; the session stays active. Any other completion failure
    /// triggers an abort, whose own failure is only logged, and the
    /// completion error is returned.
    pub async fn finish(&self, session: &mut TransferSession) -> UfileResult<()> {
        ensure_active(session)?;

        session.transition(SessionState::Finishing);
        let result = self
            .driver
            .finish_multipart(
                session.bucket(),
                session.key(),
                session.upload_id(),
                session.parts(),
            )
            .await;

        match result {
            Ok(()) => {
                info!(
                    bucket = %session.bucket(),
                    key = %session.key(),
                    parts = session.parts().len(),
                    "multipart upload completed"
                );
                session.transition(SessionState::Completed);
                Ok(())
            }
            Err(UfileError::NoParts) => {
                session.transition(SessionState::Active);
                Err(UfileError::NoParts)
            }
            Err(e) => {
                warn!(upload_id = %session.upload_id(), error = %e, "finish failed, aborting upload");
                session.transition(SessionState::Aborting);
                let abort = self
                    .driver
                    .abort_multipart(session.bucket(), session.key(), session.upload_id())
                    .await;
                match abort {
                    Ok(()) => session.transition(SessionState::Aborted),
                    Err(abort_err) => {
                        warn!(
                            upload_id = %session.upload_id(),
                            error = %abort_err,
                            "abort after failed finish also failed"
                        );
                    }
                }
                Err(e)
            }
        }
    }

    /// Abort `session`.
    ///
    /// A session whose abort failed stays in [`SessionState::Aborting`] and
    /// may be aborted again.
    ///
    /// # Errors
    ///
    /// Returns [`UfileError::NoActiveUpload`] for a session that never
    /// started or already ended, otherwise the driver error.
    pub async fn abort(&self, session: &mut TransferSession) -> UfileResult<()> {
        if !matches!(
            session.state(),
            SessionState::Active | SessionState::Aborting
        ) {
            return Err(no_active_upload(session));
        }

        session.transition(SessionState::Aborting);
        self.driver
            .abort_multipart(session.bucket(), session.key(), session.upload_id())
            .await?;
        session.transition(SessionState::Aborted);
        info!(bucket = %session.bucket(), key = %session.key(), "multipart upload aborted");
        Ok(())
    }

    /// Upload a whole object, creating the bucket and retrying once if the
    /// PUT reports the bucket-missing `RetCode`.
    ///
    /// # Errors
    ///
    /// Same rules as [`begin`](Self::begin).
    pub async fn put_object_with_bucket_recovery(
        &self,
        bucket: &str,
        key: &str,
        data: BufferList,
        length: u64,
    ) -> UfileResult<()> {
        let bucket = self.effective_bucket(bucket);
        self.with_bucket_recovery(&bucket, || {
            self.driver.put_object(&bucket, key, data.clone(), length)
        })
        .await
    }

    /// Run `op`; on the bucket-missing `RetCode` create `bucket` and run it
    /// once more.
    async fn with_bucket_recovery<T, F, Fut>(&self, bucket: &str, op: F) -> UfileResult<T>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = UfileResult<T>>,
    {
        match op().await {
            Err(e) if e.is_ret_code(self.bucket_not_exist_code) => {
                warn!(bucket = %bucket, "bucket does not exist, creating it");
                self.driver.create_bucket(bucket).await?;
                op().await
            }
            other => other,
        }
    }
}

fn ensure_active(session: &TransferSession) -> UfileResult<()> {
    if session.is_active() {
        Ok(())
    } else {
        Err(no_active_upload(session))
    }
}

fn no_active_upload(session: &TransferSession) -> UfileError {
    UfileError::NoActiveUpload {
        bucket: session.bucket().to_owned(),
        key: session.key().to_owned(),
    }
}
