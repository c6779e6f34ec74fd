//! crates/paper_desk_core/src/upload.rs
//!
//! The upload flow: submit a document, then fetch and save the generated one.

use crate::domain::{SelectedFile, UploadResponse};
use crate::ports::{DocumentApi, DownloadSink};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{error, info};

/// Used when the server does not name the generated document.
pub const DEFAULT_DOWNLOAD_NAME: &str = "output.docx";

/// Shown between the upload and the download.
pub const DOWNLOADING_STATUS: &str = "Upload complete. Downloading Word doc...";

/// The terminal state of one run. Its `Display` is the text for the result area.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadOutcome {
    NotSignedIn,
    NoFileSelected,
    UploadFailed(String),
    DownloadFailed(String),
    Downloaded { filename: String, path: PathBuf },
}

impl fmt::Display for UploadOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UploadOutcome::NotSignedIn => write!(f, "Please sign in first."),
            UploadOutcome::NoFileSelected => write!(f, "Pick a PDF first."),
            UploadOutcome::UploadFailed(body) => write!(f, "Upload failed:\n{}", body),
            UploadOutcome::DownloadFailed(body) => write!(f, "Download failed:\n{}", body),
            UploadOutcome::Downloaded { filename, .. } => write!(f, "Downloaded {}", filename),
        }
    }
}

#[derive(Clone)]
pub struct UploadFlow {
    api: Arc<dyn DocumentApi>,
    sink: Arc<dyn DownloadSink>,
    api_base: String,
}

impl UploadFlow {
    pub fn new(api_base: &str, api: Arc<dyn DocumentApi>, sink: Arc<dyn DownloadSink>) -> Self {
        Self {
            api,
            sink,
            api_base: api_base.trim_end_matches('/').to_string(),
        }
    }

    /// Runs the whole sequence once. `on_status` receives intermediate status text;
    /// the returned outcome carries the final one.
    pub async fn run(
        &self,
        token: &str,
        file: Option<SelectedFile>,
        on_status: &mut (dyn FnMut(&str) + Send),
    ) -> UploadOutcome {
        if token.is_empty() {
            return UploadOutcome::NotSignedIn;
        }
        let Some(file) = file else {
            return UploadOutcome::NoFileSelected;
        };

        info!("Uploading {} ({} bytes).", file.file_name, file.bytes.len());
        let reply = match self.api.upload(token, file).await {
            Ok(reply) => reply,
            Err(e) => {
                error!("Upload request failed: {}", e);
                return UploadOutcome::UploadFailed(e.to_string());
            }
        };
        if !reply.is_success() {
            return UploadOutcome::UploadFailed(reply.text());
        }

        let response: UploadResponse = match serde_json::from_slice(&reply.body) {
            Ok(response) => response,
            Err(e) => {
                error!("Unreadable upload response: {}", e);
                return UploadOutcome::UploadFailed(format!("unexpected response: {}", e));
            }
        };
        on_status(DOWNLOADING_STATUS);

        let url = self.resolve(&response.download_url);
        let reply = match self.api.download(token, &url).await {
            Ok(reply) => reply,
            Err(e) => {
                error!("Download request failed: {}", e);
                return UploadOutcome::DownloadFailed(e.to_string());
            }
        };
        if !reply.is_success() {
            return UploadOutcome::DownloadFailed(reply.text());
        }

        let filename = response
            .generated_doc
            .as_ref()
            .and_then(|doc| safe_file_name(&doc.filename))
            .unwrap_or_else(|| DEFAULT_DOWNLOAD_NAME.to_string());

        match self.sink.save(&filename, &reply.body).await {
            Ok(path) => {
                info!("Saved generated document to {}.", path.display());
                UploadOutcome::Downloaded { filename, path }
            }
            Err(e) => {
                error!("Could not save {}: {}", filename, e);
                UploadOutcome::DownloadFailed(e.to_string())
            }
        }
    }

    /// Resolves a download locator against the API base this flow was built with.
    pub fn resolve(&self, download_url: &str) -> String {
        if download_url.starts_with("http://") || download_url.starts_with("https://") {
            return download_url.to_string();
        }
        if download_url.starts_with('/') {
            format!("{}{}", self.api_base, download_url)
        } else {
            format!("{}/{}", self.api_base, download_url)
        }
    }
}

/// Keeps only the last path component of a server-provided name.
fn safe_file_name(name: &str) -> Option<String> {
    Path::new(name.trim())
        .file_name()
        .and_then(|name| name.to_str())
        .map(str::to_string)
}
