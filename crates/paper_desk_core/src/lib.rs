pub mod chat;
pub mod domain;
pub mod identity;
pub mod ports;
pub mod protocol;
pub mod router;
pub mod session;
pub mod upload;

#[cfg(test)]
mod testing;

pub use chat::{ChatChannel, ChatError, ChatUpdate, ConnectionState, THINKING_INTERVAL};
pub use domain::{Bubble, HttpReply, Role, Route, SelectedFile, UploadResponse};
pub use identity::{IdentityBridge, LoginError, LOGIN_FAILED_ALERT};
pub use ports::{
    AuthApi, ChatConnection, ChatConnector, DocumentApi, DownloadSink, PortError, PortResult,
    SignInWidget, TokenStorage, TransportEvent, TransportEventKind,
};
pub use router::{resolve, Navigation};
pub use session::{unverified_display_identity, SessionStore, SESSION_TOKEN_KEY};
pub use upload::{UploadFlow, UploadOutcome};
