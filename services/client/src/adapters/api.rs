//! services/client/src/adapters/api.rs
//!
//! This module contains the adapter for the remote Paper Desk HTTP API.
//! It implements the `AuthApi` and `DocumentApi` ports from the `core` crate.

use async_trait::async_trait;
use paper_desk_core::{AuthApi, DocumentApi, HttpReply, PortError, PortResult, SelectedFile};
use reqwest::{multipart, Client, Response};
use serde::Serialize;
use tracing::debug;

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// An adapter that talks to the API server over `reqwest`.
#[derive(Clone)]
pub struct HttpApiAdapter {
    client: Client,
    api_base: String,
}

#[derive(Serialize)]
struct CredentialRequest<'a> {
    credential: &'a str,
}

impl HttpApiAdapter {
    /// Creates a new `HttpApiAdapter` for the given API base.
    pub fn new(client: Client, api_base: &str) -> Self {
        Self {
            client,
            api_base: api_base.trim_end_matches('/').to_string(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.api_base, path)
    }
}

/// Turns a response into the raw status/body pair the flows inspect.
async fn into_reply(response: Response) -> PortResult<HttpReply> {
    let status = response.status().as_u16();
    let body = response
        .bytes()
        .await
        .map_err(|e| PortError::Transport(e.to_string()))?;
    debug!("API answered {} with {} bytes.", status, body.len());
    Ok(HttpReply::new(status, body))
}

//=========================================================================================
// Port Implementations
//=========================================================================================

#[async_trait]
impl AuthApi for HttpApiAdapter {
    async fn exchange_google_credential(&self, credential: &str) -> PortResult<HttpReply> {
        let response = self
            .client
            .post(self.url("/api/auth/google"))
            .json(&CredentialRequest { credential })
            .send()
            .await
            .map_err(|e| PortError::Transport(e.to_string()))?;
        into_reply(response).await
    }
}

#[async_trait]
impl DocumentApi for HttpApiAdapter {
    async fn upload(&self, token: &str, file: SelectedFile) -> PortResult<HttpReply> {
        let mut part = multipart::Part::bytes(file.bytes.to_vec()).file_name(file.file_name);
        if let Some(content_type) = &file.content_type {
            part = part
                .mime_str(content_type)
                .map_err(|e| PortError::Unexpected(e.to_string()))?;
        }
        let form = multipart::Form::new().part("file", part);

        let response = self
            .client
            .post(self.url("/api/upload"))
            .bearer_auth(token)
            .multipart(form)
            .send()
            .await
            .map_err(|e| PortError::Transport(e.to_string()))?;
        into_reply(response).await
    }

    async fn download(&self, token: &str, url: &str) -> PortResult<HttpReply> {
        let response = self
            .client
            .get(url)
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| PortError::Transport(e.to_string()))?;
        into_reply(response).await
    }
}
