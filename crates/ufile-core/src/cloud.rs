//! Gateway-facing UFile client.
//!
//! [`UfileCloud`] is what the storage gateway talks to. It takes gateway
//! bucket names, maps them to the destination bucket, and keeps the one
//! multipart [`TransferSession`] the gateway drives through
//! `begin_multipart`, `upload_part` and `finish_multipart`/`abort_multipart`.

use std::sync::Arc;

use tracing::{info, warn};
use ufile_auth::{RustCryptoProvider, Signer};

use crate::body::BufferList;
use crate::config::UfileConfig;
use crate::error::{UfileError, UfileResult};
use crate::multipart::MultipartTransfer;
use crate::request::RequestDriver;
use crate::session::TransferSession;
use crate::transport::{HttpTransport, HyperTransport};

/// UFile client used by the tiering gateway.
///
/// Holds at most one multipart upload at a time; every multipart call must
/// name the same bucket and key as the `begin_multipart` that started it.
#[derive(Debug)]
pub struct UfileCloud {
    transfer: MultipartTransfer,
    session: Option<TransferSession>,
}

impl UfileCloud {
    /// Wrap an existing state machine.
    #[must_use]
    pub fn new(transfer: MultipartTransfer) -> Self {
        Self {
            transfer,
            session: None,
        }
    }

    /// Build a client over hyper from `config`.
    ///
    /// # Errors
    ///
    /// Returns [`UfileError::Config`] if `config` is incomplete.
    pub fn from_config(config: &UfileConfig) -> UfileResult<Self> {
        Self::with_transport(config, Arc::new(HyperTransport::new()))
    }

    /// Build a client over the given transport.
    ///
    /// # Errors
    ///
    /// Returns [`UfileError::Config`] if `config` is incomplete.
    pub fn with_transport(
        config: &UfileConfig,
        transport: Arc<dyn HttpTransport>,
    ) -> UfileResult<Self> {
        config.validate()?;

        let signer = Signer::new(Arc::new(RustCryptoProvider), Arc::new(config.credentials()));
        let driver = RequestDriver::new(signer, transport);
        Ok(Self::new(MultipartTransfer::new(
            driver,
            config.bucket_not_exist_code,
        )))
    }

    /// The multipart upload in progress, if any.
    #[must_use]
    pub fn session(&self) -> Option<&TransferSession> {
        self.session.as_ref()
    }

    /// Upload a whole object.
    ///
    /// # Errors
    ///
    /// See [`MultipartTransfer::put_object_with_bucket_recovery`].
    pub async fn put_object(
        &self,
        bucket: &str,
        key: &str,
        data: BufferList,
        size: u64,
    ) -> UfileResult<()> {
        self.transfer
            .put_object_with_bucket_recovery(bucket, key, data, size)
            .await
    }

    /// Delete an object.
    ///
    /// # Errors
    ///
    /// Returns the driver error; a missing bucket is not recovered.
    pub async fn remove_object(&self, bucket: &str, key: &str) -> UfileResult<()> {
        let bucket = self.transfer.effective_bucket(bucket);
        match self.transfer.driver().delete_object(&bucket, key).await {
            Ok(()) => {
                info!(bucket = %bucket, key = %key, "object removed");
                Ok(())
            }
            Err(e) => {
                warn!(bucket = %bucket, key = %key, error = %e, "failed to remove object");
                Err(e)
            }
        }
    }

    /// Start a multipart upload, replacing any upload still in progress.
    ///
    /// # Errors
    ///
    /// See [`MultipartTransfer::begin`].
    pub async fn begin_multipart(&mut self, bucket: &str, key: &str) -> UfileResult<()> {
        if let Some(previous) = self.session.take() {
            if !previous.state().is_terminal() {
                warn!(
                    bucket = %previous.bucket(),
                    key = %previous.key(),
                    upload_id = %previous.upload_id(),
                    "discarding unfinished multipart upload"
                );
            }
        }

        self.session = Some(self.transfer.begin(bucket, key).await?);
        Ok(())
    }

    /// Upload the next part of the current multipart upload.
    ///
    /// # Errors
    ///
    /// Returns [`UfileError::NoActiveUpload`] if no upload for `bucket`/`key`
    /// is in progress, otherwise see [`MultipartTransfer::upload_part`].
    pub async fn upload_part(
        &mut self,
        bucket: &str,
        key: &str,
        data: BufferList,
        size: u64,
    ) -> UfileResult<()> {
        let bucket = self.transfer.effective_bucket(bucket);
        let session = matching_session(&mut self.session, &bucket, key)?;
        self.transfer.upload_part(session, data, size).await.map(|_| ())
    }

    /// Complete the current multipart upload.
    ///
    /// # Errors
    ///
    /// Returns [`UfileError::NoActiveUpload`] if no upload for `bucket`/`key`
    /// is in progress, otherwise see [`MultipartTransfer::finish`].
    pub async fn finish_multipart(&mut self, bucket: &str, key: &str) -> UfileResult<()> {
        let bucket = self.transfer.effective_bucket(bucket);
        let session = matching_session(&mut self.session, &bucket, key)?;
        let result = self.transfer.finish(session).await;
        self.release_terminal_session();
        result
    }

    /// Abort the current multipart upload.
    ///
    /// # Errors
    ///
    /// Returns [`UfileError::NoActiveUpload`] if no upload for `bucket`/`key`
    /// is in progress, otherwise see [`MultipartTransfer::abort`].
    pub async fn abort_multipart(&mut self, bucket: &str, key: &str) -> UfileResult<()> {
        let bucket = self.transfer.effective_bucket(bucket);
        let session = matching_session(&mut self.session, &bucket, key)?;
        let result = self.transfer.abort(session).await;
        self.release_terminal_session();
        result
    }

    fn release_terminal_session(&mut self) {
        if self
            .session
            .as_ref()
            .is_some_and(|s| s.state().is_terminal())
        {
            self.session = None;
        }
    }
}

fn matching_session<'a>(
    session: &'a mut Option<TransferSession>,
    bucket: &str,
    key: &str,
) -> UfileResult<&'a mut TransferSession> {
    match session {
        Some(s) if s.bucket() == bucket && s.key() == key => Ok(s),
        _ => Err(UfileError::NoActiveUpload {
            bucket: bucket.to_owned(),
            key: key.to_owned(),
        }),
    }
}
