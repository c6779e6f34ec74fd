//! crates/paper_desk_core/src/identity.rs
//!
//! Exchanges a Google credential for this application's own bearer token.

use crate::ports::{AuthApi, PortError};
use crate::session::SessionStore;
use serde::Deserialize;
use std::sync::Arc;
use tracing::{info, warn};

/// Text of the alert shown for any failed sign-in.
pub const LOGIN_FAILED_ALERT: &str = "Login failed";

#[derive(Debug, thiserror::Error)]
pub enum LoginError {
    #[error("Auth failed: {status}: {body}")]
    Rejected { status: u16, body: String },
    #[error("Unreadable auth response: {0}")]
    UnreadableResponse(String),
    #[error("Could not store the session token: {0}")]
    Storage(PortError),
    #[error("Auth request failed: {0}")]
    Transport(PortError),
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
}

#[derive(Clone)]
pub struct IdentityBridge {
    api: Arc<dyn AuthApi>,
}

impl IdentityBridge {
    pub fn new(api: Arc<dyn AuthApi>) -> Self {
        Self { api }
    }

    /// Performs the single `POST /api/auth/google` exchange and returns the
    /// application token. The credential is single use; failures are not retried.
    ///
    /// Needs no session, so it can run away from the task that owns one.
    pub async fn exchange(&self, credential: &str) -> Result<String, LoginError> {
        let reply = self
            .api
            .exchange_google_credential(credential)
            .await
            .map_err(LoginError::Transport)?;

        if !reply.is_success() {
            let body = reply.text();
            warn!("Google credential rejected with status {}.", reply.status);
            return Err(LoginError::Rejected {
                status: reply.status,
                body,
            });
        }

        let token: TokenResponse = serde_json::from_slice(&reply.body)
            .map_err(|e| LoginError::UnreadableResponse(e.to_string()))?;
        Ok(token.access_token)
    }

    /// Stores a token obtained from [`IdentityBridge::exchange`].
    pub fn complete(session: &mut SessionStore, token: &str) -> Result<(), LoginError> {
        session.store_token(token).map_err(LoginError::Storage)?;
        info!("Signed in as {:?}.", session.display_identity());
        Ok(())
    }

    /// Exchanges the credential and stores the resulting token.
    pub async fn sign_in(
        &self,
        session: &mut SessionStore,
        credential: &str,
    ) -> Result<(), LoginError> {
        let token = self.exchange(credential).await?;
        Self::complete(session, &token)
    }
}
