use bytes::Bytes;
use client_lib::adapters::{FileTokenStorage, FsDownloadSink, HttpApiAdapter};
use paper_desk_core::{
    AuthApi, IdentityBridge, SelectedFile, SessionStore, TokenStorage, UploadFlow, UploadOutcome,
    SESSION_TOKEN_KEY,
};
use serde_json::json;
use std::sync::Arc;
use wiremock::{
    matchers::{body_json, header, method, path},
    Mock, MockServer, ResponseTemplate,
};

fn init_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn paper() -> Option<SelectedFile> {
    Some(SelectedFile {
        file_name: "paper.pdf".to_string(),
        content_type: Some("application/pdf".to_string()),
        bytes: Bytes::from_static(b"%PDF-1.7 test"),
    })
}

async fn run_upload(server: &MockServer, dir: &std::path::Path, token: &str) -> UploadOutcome {
    let api = Arc::new(HttpApiAdapter::new(reqwest::Client::new(), &server.uri()));
    let flow = UploadFlow::new(&server.uri(), api, Arc::new(FsDownloadSink::new(dir)));
    flow.run(token, paper(), &mut |_: &str| {}).await
}

#[tokio::test]
async fn credential_exchange_posts_json() {
    init_logging();
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/auth/google"))
        .and(body_json(json!({"credential": "google-jwt"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"access_token": "t.o.k"})))
        .expect(1)
        .mount(&server)
        .await;

    let api = HttpApiAdapter::new(reqwest::Client::new(), &server.uri());
    let reply = api.exchange_google_credential("google-jwt").await.unwrap();
    assert!(reply.is_success());
    assert_eq!(reply.text(), r#"{"access_token":"t.o.k"}"#);
}

#[tokio::test]
async fn sign_in_persists_token_to_session_file() {
    init_logging();
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/auth/google"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"access_token": "a.b.c"})))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let storage = Arc::new(FileTokenStorage::new(dir.path().join("session.json")));
    let mut session = SessionStore::load(storage.clone());
    let bridge = IdentityBridge::new(Arc::new(HttpApiAdapter::new(
        reqwest::Client::new(),
        &server.uri(),
    )));

    bridge.sign_in(&mut session, "google-jwt").await.unwrap();
    assert!(session.is_authed());
    assert_eq!(storage.get(SESSION_TOKEN_KEY).unwrap().as_deref(), Some("a.b.c"));

    session.logout();
    assert!(!session.is_authed());
    assert_eq!(storage.get(SESSION_TOKEN_KEY).unwrap(), None);
}

#[tokio::test]
async fn sign_in_recovers_from_corrupt_session_file() {
    init_logging();
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/auth/google"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"access_token": "fresh.token.x"})),
        )
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("session.json");
    std::fs::write(&path, "{truncated").unwrap();
    let storage = Arc::new(FileTokenStorage::new(&path));
    let mut session = SessionStore::load(storage.clone());
    assert!(!session.is_authed());

    let bridge = IdentityBridge::new(Arc::new(HttpApiAdapter::new(
        reqwest::Client::new(),
        &server.uri(),
    )));
    bridge.sign_in(&mut session, "google-jwt").await.unwrap();

    assert!(session.is_authed());
    assert_eq!(SessionStore::load(storage).token(), "fresh.token.x");
}

#[tokio::test]
async fn upload_then_download_saves_generated_document() {
    init_logging();
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/upload"))
        .and(header("authorization", "Bearer tok"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "download_url": "/api/download/abc",
            "generated_doc": {"filename": "summary.docx"}
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/download/abc"))
        .and(header("authorization", "Bearer tok"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"PK\x03\x04docx".to_vec()))
        .expect(1)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let outcome = run_upload(&server, dir.path(), "tok").await;

    assert_eq!(outcome.to_string(), "Downloaded summary.docx");
    let saved = std::fs::read(dir.path().join("summary.docx")).unwrap();
    assert_eq!(saved, b"PK\x03\x04docx");
}

#[tokio::test]
async fn rejected_upload_shows_body_and_never_downloads() {
    init_logging();
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/upload"))
        .respond_with(ResponseTemplate::new(400).set_body_string("bad file"))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let outcome = run_upload(&server, dir.path(), "tok").await;
    assert_eq!(outcome.to_string(), "Upload failed:\nbad file");
}

#[tokio::test]
async fn signed_out_upload_sends_nothing() {
    init_logging();
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let outcome = run_upload(&server, dir.path(), "").await;
    assert_eq!(outcome.to_string(), "Please sign in first.");
    assert!(server.received_requests().await.unwrap().is_empty());
}
