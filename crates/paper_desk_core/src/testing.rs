//! In-memory port implementations for unit tests.

use crate::domain::{HttpReply, SelectedFile};
use crate::ports::{
    AuthApi, ChatConnection, ChatConnector, DocumentApi, DownloadSink, PortError, PortResult,
    SignInWidget, TokenStorage, TransportEvent,
};
use async_trait::async_trait;
use futures::channel::mpsc::UnboundedSender;
use std::collections::{HashMap, VecDeque};
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

#[derive(Default)]
pub struct MemoryStorage {
    values: Mutex<HashMap<String, String>>,
}

impl TokenStorage for MemoryStorage {
    fn get(&self, key: &str) -> PortResult<Option<String>> {
        Ok(self.values.lock().unwrap().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> PortResult<()> {
        self.values
            .lock()
            .unwrap()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> PortResult<()> {
        self.values.lock().unwrap().remove(key);
        Ok(())
    }
}

#[derive(Default)]
pub struct RecordingWidget {
    disabled: AtomicUsize,
}

impl RecordingWidget {
    pub fn disabled_count(&self) -> usize {
        self.disabled.load(Ordering::SeqCst)
    }
}

impl SignInWidget for RecordingWidget {
    fn disable_auto_select(&self) {
        self.disabled.fetch_add(1, Ordering::SeqCst);
    }
}

/// Records every opened URL and every frame written to any connection.
#[derive(Default, Clone)]
pub struct FakeConnector {
    pub opened: Arc<Mutex<Vec<String>>>,
    pub sent: Arc<Mutex<Vec<String>>>,
    pub closed: Arc<AtomicUsize>,
}

impl ChatConnector for FakeConnector {
    fn open(
        &self,
        url: &str,
        _connection: u64,
        _events: UnboundedSender<TransportEvent>,
    ) -> Box<dyn ChatConnection> {
        self.opened.lock().unwrap().push(url.to_string());
        Box::new(FakeConnection {
            sent: self.sent.clone(),
            closed: self.closed.clone(),
        })
    }
}

struct FakeConnection {
    sent: Arc<Mutex<Vec<String>>>,
    closed: Arc<AtomicUsize>,
}

impl ChatConnection for FakeConnection {
    fn send(&mut self, frame: String) -> PortResult<()> {
        self.sent.lock().unwrap().push(frame);
        Ok(())
    }

    fn close(&mut self) -> PortResult<()> {
        self.closed.fetch_add(1, Ordering::SeqCst);
        Err(PortError::Transport("already closing".to_string()))
    }
}

/// Answers requests from a queue of canned replies and records what was asked.
#[derive(Default)]
pub struct ScriptedApi {
    replies: Mutex<VecDeque<PortResult<HttpReply>>>,
    pub requests: Mutex<Vec<String>>,
}

impl ScriptedApi {
    pub fn reply(self, reply: PortResult<HttpReply>) -> Self {
        self.replies.lock().unwrap().push_back(reply);
        self
    }

    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }

    fn next(&self, request: String) -> PortResult<HttpReply> {
        self.requests.lock().unwrap().push(request);
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(PortError::Unexpected("no scripted reply".to_string())))
    }
}

#[async_trait]
impl AuthApi for ScriptedApi {
    async fn exchange_google_credential(&self, credential: &str) -> PortResult<HttpReply> {
        self.next(format!("POST /api/auth/google {credential}"))
    }
}

#[async_trait]
impl DocumentApi for ScriptedApi {
    async fn upload(&self, token: &str, file: SelectedFile) -> PortResult<HttpReply> {
        self.next(format!("POST /api/upload {} {}", token, file.file_name))
    }

    async fn download(&self, token: &str, url: &str) -> PortResult<HttpReply> {
        self.next(format!("GET {url} {token}"))
    }
}

#[derive(Default)]
pub struct MemorySink {
    pub saved: Mutex<Vec<(String, Vec<u8>)>>,
}

#[async_trait]
impl DownloadSink for MemorySink {
    async fn save(&self, filename: &str, bytes: &[u8]) -> PortResult<PathBuf> {
        self.saved
            .lock()
            .unwrap()
            .push((filename.to_string(), bytes.to_vec()));
        Ok(PathBuf::from("/downloads").join(filename))
    }
}
