//! crates/paper_desk_core/src/ports.rs
//!
//! Defines the service contracts (traits) for the client's core logic.
//! These traits form the boundary of the hexagonal architecture, allowing the core
//! to be independent of the concrete HTTP, WebSocket and filesystem implementations.

use crate::domain::{HttpReply, SelectedFile};
use async_trait::async_trait;
use futures::channel::mpsc::UnboundedSender;
use std::path::PathBuf;

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// A generic error type for all port operations.
/// This abstracts away the specific errors from external services (e.g., network, disk).
#[derive(Debug, thiserror::Error)]
pub enum PortError {
    #[error("Transport failure: {0}")]
    Transport(String),
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Durable Storage
//=========================================================================================

/// A small durable key/value store, the native stand-in for browser `localStorage`.
pub trait TokenStorage: Send + Sync {
    fn get(&self, key: &str) -> PortResult<Option<String>>;
    fn set(&self, key: &str, value: &str) -> PortResult<()>;
    fn remove(&self, key: &str) -> PortResult<()>;
}

//=========================================================================================
// Remote API
//=========================================================================================

#[async_trait]
pub trait AuthApi: Send + Sync {
    /// `POST /api/auth/google` with the provider credential.
    async fn exchange_google_credential(&self, credential: &str) -> PortResult<HttpReply>;
}

#[async_trait]
pub trait DocumentApi: Send + Sync {
    /// `POST /api/upload` as a multipart body with a single `file` field.
    async fn upload(&self, token: &str, file: SelectedFile) -> PortResult<HttpReply>;

    /// `GET` of an absolute download URL.
    async fn download(&self, token: &str, url: &str) -> PortResult<HttpReply>;
}

/// Where downloaded documents end up.
#[async_trait]
pub trait DownloadSink: Send + Sync {
    /// Saves `bytes` under `filename` and returns the final location.
    async fn save(&self, filename: &str, bytes: &[u8]) -> PortResult<PathBuf>;
}

//=========================================================================================
// Identity Widget
//=========================================================================================

/// The third-party sign-in widget, seen from the session store.
pub trait SignInWidget: Send + Sync {
    /// Stops the widget from silently re-selecting the last account.
    fn disable_auto_select(&self);
}

//=========================================================================================
// Chat Transport
//=========================================================================================

/// Something that happened on a chat transport. `connection` identifies the
/// transport that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportEvent {
    pub connection: u64,
    pub kind: TransportEventKind,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportEventKind {
    Opened,
    Frame(String),
    Error(String),
    Closed,
}

/// Opens duplex chat connections.
///
/// `open` returns immediately; the handshake happens in the background and its
/// outcome, like every later frame, is reported through `events`.
pub trait ChatConnector: Send + Sync {
    fn open(
        &self,
        url: &str,
        connection: u64,
        events: UnboundedSender<TransportEvent>,
    ) -> Box<dyn ChatConnection>;
}

/// The writable half of one open chat transport.
pub trait ChatConnection: Send {
    fn send(&mut self, frame: String) -> PortResult<()>;
    fn close(&mut self) -> PortResult<()>;
}
