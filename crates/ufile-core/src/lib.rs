//! UCloud UFile tiering client.
//!
//! Uploads, multipart-uploads and deletes objects in UFile on behalf of a
//! storage gateway that tiers data to external clouds.
//!
//! # Architecture
//!
//! ```text
//! UfileCloud (gateway interface, one active session)
//!        |
//!        v
//! MultipartTransfer (init / parts / finish / abort, bucket recovery)
//!        |
//!        v
//! RequestDriver (one signed exchange per call)
//!        |                      |
//!        v                      v
//! ufile_auth::Signer      HttpTransport (hyper) <- FeederBody (BufferList)
//! ```
//!
//! # Modules
//!
//! - [`body`] - Streaming request bodies over buffer lists
//! - [`cloud`] - Gateway-facing client
//! - [`config`] - Configuration and environment loading
//! - [`error`] - Error types
//! - [`multipart`] - Multipart transfer state machine
//! - [`request`] - Single-exchange request driver
//! - [`session`] - Multipart session state
//! - [`transport`] - HTTP transport trait and hyper implementation

pub mod body;
pub mod cloud;
pub mod config;
pub mod error;
pub mod multipart;
pub mod request;
pub mod session;
pub mod transport;

#[cfg(test)]
mod testing;

pub use body::{BufferList, FeederBody};
pub use cloud::UfileCloud;
pub use config::UfileConfig;
pub use error::{UfileError, UfileResult};
pub use multipart::MultipartTransfer;
pub use request::{InitiatedUpload, RequestDriver};
pub use session::{SessionState, TransferSession};
pub use transport::{HttpTransport, HyperTransport};
