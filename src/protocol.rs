use serde::Serialize;
use serde_json::{Map, Value};

/// Reply sent back to the connection a message came from.
///
/// Control replies carry a `type` field, acknowledgements a `status` field.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(untagged)]
pub enum ServerMessage {
    Control(ControlReply),
    Status(StatusReply),
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ControlReply {
    Pong {
        timestamp: String,
    },
    EchoResponse {
        original_message: Map<String, Value>,
        timestamp: String,
    },
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum StatusReply {
    Received {
        #[serde(flatten)]
        detail: ReceivedDetail,
        timestamp: String,
        message: String,
    },
    Error {
        message: String,
        timestamp: String,
    },
}

/// What the acknowledgement says about the payload it received
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum ReceivedDetail {
    MessageType(String),
    DataType(String),
    MessageLength(usize),
}

fn now() -> String {
    chrono::Utc::now().to_rfc3339()
}

impl ServerMessage {
    pub fn pong() -> Self {
        Self::Control(ControlReply::Pong { timestamp: now() })
    }

    pub fn echo(original_message: Map<String, Value>) -> Self {
        Self::Control(ControlReply::EchoResponse {
            original_message,
            timestamp: now(),
        })
    }

    pub fn received(detail: ReceivedDetail) -> Self {
        let message = match detail {
            ReceivedDetail::MessageType(_) => "Structured message received successfully",
            ReceivedDetail::DataType(_) => "JSON data received successfully",
            ReceivedDetail::MessageLength(_) => "Text message received successfully",
        };
        Self::Status(StatusReply::Received {
            detail,
            timestamp: now(),
            message: message.to_string(),
        })
    }

    pub fn error(fault: impl std::fmt::Display) -> Self {
        Self::Status(StatusReply::Error {
            message: format!("Error processing message: {}", fault),
            timestamp: now(),
        })
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Self::Status(StatusReply::Error { .. }))
    }
}
