//! crates/paper_desk_core/src/chat.rs
//!
//! The chat channel: one duplex connection to `/ws/chat`, the rendered chat log and
//! the status line with its "thinking" indicator.
//!
//! The channel is a plain state machine. It never blocks; transports report back
//! through [`TransportEvent`]s which the owner feeds into [`ChatChannel::handle`]
//! one at a time. Every mutating call returns the [`ChatUpdate`]s a view needs
//! to redraw.

use crate::domain::{Bubble, Role};
use crate::ports::{ChatConnection, ChatConnector, TransportEvent, TransportEventKind};
use crate::protocol::{ClientFrame, ServerFrame};
use futures::channel::mpsc::UnboundedSender;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// How often the thinking indicator advances.
pub const THINKING_INTERVAL: Duration = Duration::from_millis(350);

const THINKING_LABEL: &str = "Thinking";

#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    #[error("Unexpected API base: {0}")]
    UnexpectedApiBase(String),
}

//=========================================================================================
// Connection State
//=========================================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Idle,
    Connecting,
    Connected,
    Disconnected,
}

impl ConnectionState {
    /// A live connection blocks new connection attempts.
    pub fn is_live(self) -> bool {
        matches!(self, ConnectionState::Connecting | ConnectionState::Connected)
    }

    fn allows(self, next: ConnectionState) -> bool {
        use ConnectionState::*;
        matches!(
            (self, next),
            (Idle | Disconnected, Connecting)
                | (Connecting, Connected)
                | (Connecting | Connected | Disconnected, Disconnected)
                | (_, Idle)
        )
    }
}

/// A change the view has to render.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatUpdate {
    Status(String),
    BubbleAdded { index: usize, role: Role, text: String },
    BubbleChanged { index: usize, text: String },
    /// The assistant bubble at `index` will not receive more text.
    BubbleClosed { index: usize },
}

//=========================================================================================
// Status Line
//=========================================================================================

#[derive(Debug, Default)]
struct StatusLine {
    text: String,
    /// The last label sent by the server; shown again once thinking stops.
    last_label: String,
    /// Number of trailing dots while the thinking indicator runs.
    thinking: Option<usize>,
}

//=========================================================================================
// Chat Channel
//=========================================================================================

pub struct ChatChannel {
    connector: Arc<dyn ChatConnector>,
    events: UnboundedSender<TransportEvent>,
    ws_base: String,
    state: ConnectionState,
    connection: Option<Box<dyn ChatConnection>>,
    /// Id of the connection this channel currently owns, 0 when none.
    connection_id: u64,
    last_issued_id: u64,
    log: Vec<Bubble>,
    /// Index of the assistant bubble still receiving deltas.
    pending: Option<usize>,
    status: StatusLine,
}

impl ChatChannel {
    /// Creates an idle channel for the given API base (`http://` or `https://`).
    pub fn new(
        api_base: &str,
        connector: Arc<dyn ChatConnector>,
        events: UnboundedSender<TransportEvent>,
    ) -> Result<Self, ChatError> {
        Ok(Self {
            connector,
            events,
            ws_base: ws_base_from_api_base(api_base)?,
            state: ConnectionState::Idle,
            connection: None,
            connection_id: 0,
            last_issued_id: 0,
            log: Vec::new(),
            pending: None,
            status: StatusLine::default(),
        })
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn log(&self) -> &[Bubble] {
        &self.log
    }

    pub fn status(&self) -> &str {
        &self.status.text
    }

    pub fn is_thinking(&self) -> bool {
        self.status.thinking.is_some()
    }

    /// Opens a connection unless the token is empty or one is already live.
    pub fn connect(&mut self, token: &str) -> Vec<ChatUpdate> {
        if token.is_empty() || self.state.is_live() {
            return Vec::new();
        }

        self.last_issued_id += 1;
        self.connection_id = self.last_issued_id;
        info!("Opening chat connection {}.", self.connection_id);

        let url = chat_url(&self.ws_base, token);
        self.connection = Some(
            self.connector
                .open(&url, self.connection_id, self.events.clone()),
        );
        self.set_state(ConnectionState::Connecting);
        vec![self.show("Connecting...")]
    }

    /// Closes the connection if there is one and returns to `Idle`.
    pub fn disconnect(&mut self) -> Vec<ChatUpdate> {
        let mut updates = Vec::new();
        if let Some(mut connection) = self.connection.take() {
            if let Err(e) = connection.close() {
                debug!("Ignoring error while closing chat connection: {}", e);
            }
        }
        let was_live = self.state.is_live();
        self.connection_id = 0;
        self.set_state(ConnectionState::Idle);
        updates.extend(self.stop_thinking());
        if was_live {
            info!("Chat connection closed by the client.");
            updates.push(self.show("Disconnected"));
        }
        updates
    }

    /// Sends a user message. Ignored unless connected and `text` has content.
    pub fn send(&mut self, text: &str) -> Vec<ChatUpdate> {
        let text = text.trim();
        if text.is_empty() || self.state != ConnectionState::Connected {
            return Vec::new();
        }
        let Some(connection) = self.connection.as_mut() else {
            return Vec::new();
        };

        let frame = match serde_json::to_string(&ClientFrame::UserMessage {
            text: text.to_string(),
        }) {
            Ok(frame) => frame,
            Err(e) => {
                error!("Failed to encode user message: {}", e);
                return Vec::new();
            }
        };

        self.log.push(Bubble {
            role: Role::User,
            text: text.to_string(),
        });
        let mut updates = vec![ChatUpdate::BubbleAdded {
            index: self.log.len() - 1,
            role: Role::User,
            text: text.to_string(),
        }];

        if let Err(e) = connection.send(frame) {
            error!("Failed to send user message: {}", e);
        }
        updates.extend(self.start_thinking());
        updates
    }

    /// Advances the thinking indicator by one step.
    pub fn tick(&mut self) -> Option<ChatUpdate> {
        let dots = self.status.thinking.as_mut()?;
        *dots = (*dots + 1) % 4;
        let text = format!("{}{}", THINKING_LABEL, ".".repeat(*dots));
        Some(self.show(&text))
    }

    /// Applies one transport event. Events from connections this channel no
    /// longer owns are dropped.
    pub fn handle(&mut self, event: TransportEvent) -> Vec<ChatUpdate> {
        if self.connection_id == 0 || event.connection != self.connection_id {
            debug!("Dropping event from stale connection {}.", event.connection);
            return Vec::new();
        }

        match event.kind {
            TransportEventKind::Opened => {
                if self.set_state(ConnectionState::Connected) {
                    info!("Chat connection {} established.", event.connection);
                    vec![self.show("Connected")]
                } else {
                    Vec::new()
                }
            }
            TransportEventKind::Frame(raw) => self.handle_frame(&raw),
            TransportEventKind::Error(detail) => {
                warn!("Chat connection error: {}", detail);
                self.set_state(ConnectionState::Disconnected);
                vec![self.show("Connection error")]
            }
            TransportEventKind::Closed => {
                info!("Chat connection {} closed.", event.connection);
                let mut updates: Vec<ChatUpdate> = self.stop_thinking().into_iter().collect();
                self.set_state(ConnectionState::Disconnected);
                self.connection = None;
                updates.push(self.show("Disconnected"));
                updates
            }
        }
    }

    fn handle_frame(&mut self, raw: &str) -> Vec<ChatUpdate> {
        let frame = match serde_json::from_str::<ServerFrame>(raw) {
            Ok(frame) => frame,
            Err(e) => {
                warn!("Failed to deserialize server frame: {}", e);
                return Vec::new();
            }
        };
        debug!("Received frame: {:?}", frame);

        match frame {
            ServerFrame::AssistantDelta { delta } => {
                let mut updates: Vec<ChatUpdate> = self.stop_thinking().into_iter().collect();
                let (index, created) = self.open_assistant_bubble();
                self.log[index].text.push_str(&delta);
                updates.push(self.bubble_update(index, created));
                updates
            }
            ServerFrame::AssistantMessage { text } => {
                let mut updates: Vec<ChatUpdate> = self.stop_thinking().into_iter().collect();
                let (index, created) = self.open_assistant_bubble();
                self.log[index].text = text;
                self.pending = None;
                updates.push(self.bubble_update(index, created));
                updates.push(ChatUpdate::BubbleClosed { index });
                updates
            }
            ServerFrame::Status { message } => {
                self.status.last_label = message.clone();
                vec![self.show(&message)]
            }
            ServerFrame::Error { message } => vec![self.show(&format!("Error: {}", message))],
            ServerFrame::Unknown => Vec::new(),
        }
    }

    fn open_assistant_bubble(&mut self) -> (usize, bool) {
        match self.pending {
            Some(index) => (index, false),
            None => {
                self.log.push(Bubble {
                    role: Role::Assistant,
                    text: String::new(),
                });
                let index = self.log.len() - 1;
                self.pending = Some(index);
                (index, true)
            }
        }
    }

    fn bubble_update(&self, index: usize, created: bool) -> ChatUpdate {
        let text = self.log[index].text.clone();
        if created {
            ChatUpdate::BubbleAdded {
                index,
                role: Role::Assistant,
                text,
            }
        } else {
            ChatUpdate::BubbleChanged { index, text }
        }
    }

    fn start_thinking(&mut self) -> Option<ChatUpdate> {
        if self.status.thinking.is_some() {
            return None;
        }
        self.status.thinking = Some(0);
        Some(self.show(THINKING_LABEL))
    }

    fn stop_thinking(&mut self) -> Option<ChatUpdate> {
        self.status.thinking.take()?;
        if self.status.last_label.is_empty() {
            return None;
        }
        let label = self.status.last_label.clone();
        Some(self.show(&label))
    }

    fn show(&mut self, text: &str) -> ChatUpdate {
        self.status.text = text.to_string();
        ChatUpdate::Status(self.status.text.clone())
    }

    fn set_state(&mut self, next: ConnectionState) -> bool {
        if !self.state.allows(next) {
            debug!("Ignoring chat state change {:?} -> {:?}.", self.state, next);
            return false;
        }
        self.state = next;
        true
    }
}

/// Derives the WebSocket origin from the HTTP API base.
pub fn ws_base_from_api_base(api_base: &str) -> Result<String, ChatError> {
    let base = api_base.trim_end_matches('/');
    if let Some(rest) = base.strip_prefix("https://") {
        Ok(format!("wss://{}", rest))
    } else if let Some(rest) = base.strip_prefix("http://") {
        Ok(format!("ws://{}", rest))
    } else {
        Err(ChatError::UnexpectedApiBase(api_base.to_string()))
    }
}

pub fn chat_url(ws_base: &str, token: &str) -> String {
    format!("{}/ws/chat?token={}", ws_base, urlencoding::encode(token))
}
