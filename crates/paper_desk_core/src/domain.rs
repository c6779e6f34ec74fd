//! crates/paper_desk_core/src/domain.rs
//!
//! Defines the plain data structures shared by the core components and the
//! adapters. None of these outlive the client process except the session token.

use bytes::Bytes;
use serde::Deserialize;

//=========================================================================================
// Navigation
//=========================================================================================

/// One of the three panels the client can show.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Landing,
    Chat,
    Upload,
}

impl Route {
    /// Maps a URL fragment to a route. Unknown or missing fragments are the landing page.
    pub fn from_fragment(fragment: &str) -> Self {
        match fragment.trim().trim_start_matches('#') {
            "/chat" => Route::Chat,
            "/upload" => Route::Upload,
            _ => Route::Landing,
        }
    }

    pub fn fragment(self) -> &'static str {
        match self {
            Route::Landing => "#/landing",
            Route::Chat => "#/chat",
            Route::Upload => "#/upload",
        }
    }

    /// Whether the panel is only reachable with a session token.
    pub fn requires_auth(self) -> bool {
        !matches!(self, Route::Landing)
    }
}

//=========================================================================================
// Chat Log
//=========================================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    User,
    Assistant,
}

/// A single rendered entry of the chat log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bubble {
    pub role: Role,
    pub text: String,
}

//=========================================================================================
// Upload
//=========================================================================================

/// The file picked by the user for the upload panel.
#[derive(Debug, Clone)]
pub struct SelectedFile {
    pub file_name: String,
    pub content_type: Option<String>,
    pub bytes: Bytes,
}

/// The successful response of `POST /api/upload`.
#[derive(Debug, Clone, Deserialize)]
pub struct UploadResponse {
    pub download_url: String,
    #[serde(default)]
    pub generated_doc: Option<GeneratedDoc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GeneratedDoc {
    pub filename: String,
}

//=========================================================================================
// HTTP
//=========================================================================================

/// A raw HTTP answer. Adapters never interpret the status; the flows do, so that
/// error bodies can be shown to the user verbatim.
#[derive(Debug, Clone)]
pub struct HttpReply {
    pub status: u16,
    pub body: Bytes,
}

impl HttpReply {
    pub fn new(status: u16, body: impl Into<Bytes>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// The body as text, replacing invalid UTF-8 sequences.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}
