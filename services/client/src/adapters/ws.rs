//! services/client/src/adapters/ws.rs
//!
//! The chat transport over `tokio-tungstenite`.
//! It implements the `ChatConnector` port from the `core` crate.
//!
//! Each connection runs on its own task which owns the socket. The task reports
//! everything it sees as `TransportEvent`s and is stopped through a
//! `CancellationToken` when the client closes the connection.

use futures::channel::mpsc::UnboundedSender;
use futures::{SinkExt, StreamExt};
use paper_desk_core::{
    ChatConnection, ChatConnector, PortError, PortResult, TransportEvent, TransportEventKind,
};
use tokio::sync::mpsc;
use tokio_tungstenite::{connect_async, tungstenite::Message};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

#[derive(Clone, Default)]
pub struct TungsteniteConnector;

impl ChatConnector for TungsteniteConnector {
    fn open(
        &self,
        url: &str,
        connection: u64,
        events: UnboundedSender<TransportEvent>,
    ) -> Box<dyn ChatConnection> {
        let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();
        let cancel = CancellationToken::new();

        tokio::spawn(pump(
            url.to_string(),
            connection,
            events,
            outbound_rx,
            cancel.clone(),
        ));

        Box::new(TungsteniteConnection {
            outbound: outbound_tx,
            cancel,
        })
    }
}

/// Handle kept by the chat channel.
pub struct TungsteniteConnection {
    outbound: mpsc::UnboundedSender<String>,
    cancel: CancellationToken,
}

impl ChatConnection for TungsteniteConnection {
    fn send(&mut self, frame: String) -> PortResult<()> {
        self.outbound
            .send(frame)
            .map_err(|_| PortError::Transport("chat connection is gone".to_string()))
    }

    fn close(&mut self) -> PortResult<()> {
        if self.cancel.is_cancelled() {
            return Err(PortError::Transport("already closed".to_string()));
        }
        self.cancel.cancel();
        Ok(())
    }
}

impl Drop for TungsteniteConnection {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

async fn pump(
    url: String,
    connection: u64,
    events: UnboundedSender<TransportEvent>,
    mut outbound: mpsc::UnboundedReceiver<String>,
    cancel: CancellationToken,
) {
    let emit = |kind: TransportEventKind| {
        // The receiver only disappears when the client is shutting down.
        let _ = events.unbounded_send(TransportEvent { connection, kind });
    };

    let socket = tokio::select! {
        _ = cancel.cancelled() => {
            emit(TransportEventKind::Closed);
            return;
        }
        result = connect_async(url.as_str()) => result,
    };
    let (socket, _response) = match socket {
        Ok(pair) => pair,
        Err(e) => {
            error!("Chat connection {} failed: {}", connection, e);
            emit(TransportEventKind::Error(e.to_string()));
            emit(TransportEventKind::Closed);
            return;
        }
    };
    emit(TransportEventKind::Opened);

    let (mut sink, mut stream) = socket.split();
    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                if let Err(e) = sink.send(Message::Close(None)).await {
                    debug!("Close frame not delivered: {}", e);
                }
                break;
            }
            Some(frame) = outbound.recv() => {
                if let Err(e) = sink.send(Message::Text(frame.into())).await {
                    error!("Failed to write chat frame: {}", e);
                    emit(TransportEventKind::Error(e.to_string()));
                    break;
                }
            }
            incoming = stream.next() => match incoming {
                Some(Ok(Message::Text(text))) => {
                    emit(TransportEventKind::Frame(text.as_str().to_owned()));
                }
                Some(Ok(Message::Close(_))) | None => {
                    info!("Server closed chat connection {}.", connection);
                    break;
                }
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    error!("Chat connection {} read error: {}", connection, e);
                    emit(TransportEventKind::Error(e.to_string()));
                    break;
                }
            },
        }
    }
    emit(TransportEventKind::Closed);
}
