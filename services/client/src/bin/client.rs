//! services/client/src/bin/client.rs

use client_lib::{
    adapters::{
        FileTokenStorage, FsDownloadSink, GoogleSignIn, HttpApiAdapter, TungsteniteConnector,
    },
    config::Config,
    error::ClientError,
    shell::{run, AppState, ShellContext, TerminalView},
};
use paper_desk_core::SignInWidget;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), ClientError> {
    // --- 1. Load Configuration & Set Up Logging ---
    let config = Arc::new(Config::from_env()?);
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(config.log_level.to_string()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
    info!("Configuration loaded. API base is {}", config.api_base);

    // --- 2. Start the Sign-in Page ---
    let (credential_tx, credential_rx) = mpsc::unbounded_channel();
    let sign_in = Arc::new(
        GoogleSignIn::start(
            config.signin_bind_address,
            &config.google_client_id,
            credential_tx,
        )
        .await?,
    );

    // --- 3. Initialize Service Adapters ---
    let http = reqwest::Client::builder().build()?;
    let api = Arc::new(HttpApiAdapter::new(http, &config.api_base));

    let app_state = AppState {
        config: config.clone(),
        storage: Arc::new(FileTokenStorage::new(&config.session_file)),
        auth_api: api.clone(),
        document_api: api,
        downloads: Arc::new(FsDownloadSink::new(&config.download_dir)),
        chat_connector: Arc::new(TungsteniteConnector),
        sign_in: Some(sign_in.clone() as Arc<dyn SignInWidget>),
    };

    // --- 4. Build the Shell and Run ---
    let (transport_tx, transport_rx) = futures::channel::mpsc::unbounded();
    let (upload_tx, upload_rx) = mpsc::unbounded_channel();
    let (login_tx, login_rx) = mpsc::unbounded_channel();
    let mut shell = ShellContext::new(
        &app_state,
        TerminalView::default(),
        transport_tx,
        upload_tx,
        login_tx,
    )?;
    shell.sign_in_url = Some(sign_in.url().to_string());

    info!("Session file: {}", config.session_file.display());
    info!("Downloads go to {}", config.download_dir.display());
    run(shell, transport_rx, credential_rx, upload_rx, login_rx).await
}
