//! services/client/src/shell/state.rs
//!
//! Defines the client's shared adapters and the per-run shell context built from them.

use crate::config::Config;
use crate::shell::view::View;
use futures::channel::mpsc::UnboundedSender;
use paper_desk_core::{
    AuthApi, ChatChannel, ChatConnector, ChatError, DocumentApi, DownloadSink, IdentityBridge,
    LoginError, SessionStore, SignInWidget, TokenStorage, TransportEvent, UploadFlow,
};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::mpsc;

/// The outcome of a background credential exchange: the new token or why it failed.
pub type LoginResult = Result<String, LoginError>;

//=========================================================================================
// AppState (Created Once at Startup)
//=========================================================================================

/// The adapters the shell is wired with, created once at startup.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub storage: Arc<dyn TokenStorage>,
    pub auth_api: Arc<dyn AuthApi>,
    pub document_api: Arc<dyn DocumentApi>,
    pub downloads: Arc<dyn DownloadSink>,
    pub chat_connector: Arc<dyn ChatConnector>,
    pub sign_in: Option<Arc<dyn SignInWidget>>,
}

//=========================================================================================
// ShellContext (Everything the Shell Owns)
//=========================================================================================

/// The mutable state of one client run. Replaces what a browser page would keep
/// in module-level variables.
pub struct ShellContext<V: View> {
    pub session: SessionStore,
    pub identity: IdentityBridge,
    pub chat: ChatChannel,
    pub upload: UploadFlow,
    pub view: V,
    /// The current `#/...` fragment.
    pub fragment: String,
    pub selected_file: Option<PathBuf>,
    /// Where the sign-in page can be opened, when it is running.
    pub sign_in_url: Option<String>,
    /// Intermediate and final upload statuses produced by background upload jobs.
    pub upload_status: mpsc::UnboundedSender<String>,
    /// Results of credential exchanges running in the background.
    pub login_results: mpsc::UnboundedSender<LoginResult>,
}

impl<V: View> ShellContext<V> {
    pub fn new(
        state: &AppState,
        view: V,
        transport_events: UnboundedSender<TransportEvent>,
        upload_status: mpsc::UnboundedSender<String>,
        login_results: mpsc::UnboundedSender<LoginResult>,
    ) -> Result<Self, ChatError> {
        let mut session = SessionStore::load(state.storage.clone());
        if let Some(widget) = &state.sign_in {
            session = session.with_widget(widget.clone());
        }

        Ok(Self {
            session,
            identity: IdentityBridge::new(state.auth_api.clone()),
            chat: ChatChannel::new(
                &state.config.api_base,
                state.chat_connector.clone(),
                transport_events,
            )?,
            upload: UploadFlow::new(
                &state.config.api_base,
                state.document_api.clone(),
                state.downloads.clone(),
            ),
            view,
            fragment: String::new(),
            selected_file: None,
            sign_in_url: None,
            upload_status,
            login_results,
        })
    }
}
