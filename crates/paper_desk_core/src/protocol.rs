//! crates/paper_desk_core/src/protocol.rs
//!
//! Defines the WebSocket message protocol between this client and the chat endpoint.

use serde::{Deserialize, Serialize};

//=========================================================================================
// Messages Sent FROM the Client TO the Server
//=========================================================================================

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientFrame {
    /// A line typed by the user.
    UserMessage { text: String },
}

//=========================================================================================
// Messages Sent FROM the Server TO the Client
//=========================================================================================

#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerFrame {
    /// An incremental fragment of the assistant's answer.
    AssistantDelta { delta: String },

    /// The complete answer. Closes the bubble the deltas were written into.
    AssistantMessage { text: String },

    /// A short label describing what the server is doing (e.g. which agent answers).
    Status { message: String },

    /// A non-fatal error; the connection stays open.
    Error { message: String },

    /// Any frame type this client does not know about.
    #[serde(other)]
    Unknown,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_message_is_tagged() {
        let json = serde_json::to_value(ClientFrame::UserMessage {
            text: "hi".to_string(),
        })
        .unwrap();
        assert_eq!(json, serde_json::json!({"type": "user_message", "text": "hi"}));
    }

    #[test]
    fn server_frames_decode_by_type() {
        let frame: ServerFrame =
            serde_json::from_str(r#"{"type":"assistant_delta","delta":"Hel"}"#).unwrap();
        assert_eq!(
            frame,
            ServerFrame::AssistantDelta {
                delta: "Hel".to_string()
            }
        );

        let frame: ServerFrame =
            serde_json::from_str(r#"{"type":"status","message":"Agent: writer"}"#).unwrap();
        assert_eq!(
            frame,
            ServerFrame::Status {
                message: "Agent: writer".to_string()
            }
        );

        let frame: ServerFrame = serde_json::from_str(r#"{"type":"heartbeat"}"#).unwrap();
        assert_eq!(frame, ServerFrame::Unknown);
    }
}
