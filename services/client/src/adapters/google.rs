//! services/client/src/adapters/google.rs
//!
//! Hosts the Google Identity Services button on a loopback page.
//!
//! The page renders the button into its `googleBtn` slot and posts the credential
//! of the widget callback back to `/credential`, which forwards it to the shell.
//! It implements the `SignInWidget` port from the `core` crate.

use axum::{
    extract::State,
    http::StatusCode,
    response::{Html, IntoResponse},
    routing::{get, post},
    Json, Router,
};
use paper_desk_core::SignInWidget;
use serde::Deserialize;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{error, info, warn};

//=========================================================================================
// Request Types
//=========================================================================================

#[derive(Deserialize)]
pub struct CredentialPayload {
    pub credential: String,
}

//=========================================================================================
// Widget State
//=========================================================================================

#[derive(Clone)]
struct PageState {
    client_id: String,
    disable_auto_select: Arc<AtomicBool>,
    credentials: mpsc::UnboundedSender<String>,
}

/// The running sign-in page.
pub struct GoogleSignIn {
    url: String,
    disable_auto_select: Arc<AtomicBool>,
}

impl GoogleSignIn {
    /// Binds the loopback listener and serves the sign-in page in the background.
    /// Credentials from the widget callback are sent to `credentials`.
    pub async fn start(
        bind_address: SocketAddr,
        client_id: &str,
        credentials: mpsc::UnboundedSender<String>,
    ) -> std::io::Result<Self> {
        let disable_auto_select = Arc::new(AtomicBool::new(false));
        let app = router(PageState {
            client_id: client_id.to_string(),
            disable_auto_select: disable_auto_select.clone(),
            credentials,
        });

        let listener = tokio::net::TcpListener::bind(bind_address).await?;
        let local = listener.local_addr()?;
        tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, app).await {
                error!("Sign-in page stopped: {}", e);
            }
        });
        info!("Sign-in page listening on {}", local);

        Ok(Self {
            url: format!("http://{}/", local),
            disable_auto_select,
        })
    }

    /// Where the user opens the sign-in button.
    pub fn url(&self) -> &str {
        &self.url
    }
}

impl SignInWidget for GoogleSignIn {
    fn disable_auto_select(&self) {
        self.disable_auto_select.store(true, Ordering::SeqCst);
    }
}

fn router(state: PageState) -> Router {
    Router::new()
        .route("/", get(page_handler))
        .route("/credential", post(credential_handler))
        .with_state(state)
}

//=========================================================================================
// Handlers
//=========================================================================================

/// GET / - The page with the Google button.
async fn page_handler(State(state): State<PageState>) -> Html<String> {
    let disable = state.disable_auto_select.swap(false, Ordering::SeqCst);
    Html(render_page(&state.client_id, disable))
}

/// POST /credential - Receives the credential from the widget callback.
async fn credential_handler(
    State(state): State<PageState>,
    Json(payload): Json<CredentialPayload>,
) -> impl IntoResponse {
    if payload.credential.is_empty() {
        warn!("Sign-in page posted an empty credential.");
        return StatusCode::BAD_REQUEST;
    }
    match state.credentials.send(payload.credential) {
        Ok(()) => StatusCode::NO_CONTENT,
        Err(_) => StatusCode::SERVICE_UNAVAILABLE,
    }
}

fn render_page(client_id: &str, disable_auto_select: bool) -> String {
    let client_id = serde_json::to_string(client_id).unwrap_or_else(|_| "\"\"".to_string());
    let disable = if disable_auto_select {
        "google.accounts.id.disableAutoSelect();"
    } else {
        ""
    };
    format!(
        r#"<!doctype html>
<html>
<head>
  <meta charset="utf-8">
  <title>Paper Desk sign-in</title>
  <script src="https://accounts.google.com/gsi/client" async defer></script>
</head>
<body>
  <div id="googleBtn"></div>
  <p id="result"></p>
  <script>
    window.onload = () => {{
      google.accounts.id.initialize({{
        client_id: {client_id},
        callback: async (resp) => {{
          const r = await fetch("/credential", {{
            method: "POST",
            headers: {{ "Content-Type": "application/json" }},
            body: JSON.stringify({{ credential: resp.credential }}),
          }});
          document.getElementById("result").textContent = r.ok
            ? "Signed in. You can return to the terminal."
            : "Could not reach the terminal client.";
        }},
      }});
      {disable}
      google.accounts.id.renderButton(document.getElementById("googleBtn"), {{ theme: "outline", size: "large" }});
    }};
  </script>
</body>
</html>
"#
    )
}
