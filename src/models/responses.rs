use serde::{Deserialize, Serialize};
use crate::services::cache::CacheStats;

/// Kind of frame pushed to the chat client
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FrameType {
    StatusUpdate,
    AiResponse,
    Error,
}

/// Frame sent to the chat client over the WebSocket
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutboundFrame {
    #[serde(rename = "type")]
    pub frame_type: FrameType,
    pub message: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

impl OutboundFrame {
    fn new(frame_type: FrameType, message: impl Into<String>) -> Self {
        Self {
            frame_type,
            message: message.into(),
            timestamp: chrono::Utc::now(),
        }
    }

    pub fn status(message: impl Into<String>) -> Self {
        Self::new(FrameType::StatusUpdate, message)
    }

    pub fn response(message: impl Into<String>) -> Self {
        Self::new(FrameType::AiResponse, message)
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::new(FrameType::Error, message)
    }
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

/// Runtime statistics
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatsResponse {
    pub cache: CacheStats,
    pub active_connections: usize,
    pub max_connections: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_wire_format() {
        let frame = OutboundFrame::status("Searching...");
        let json = serde_json::to_value(&frame).unwrap();

        assert_eq!(json["type"], "status_update");
        assert_eq!(json["message"], "Searching...");
        assert!(json["timestamp"].is_string());

        let json = serde_json::to_value(OutboundFrame::response("hi")).unwrap();
        assert_eq!(json["type"], "ai_response");
        let json = serde_json::to_value(OutboundFrame::error("bad")).unwrap();
        assert_eq!(json["type"], "error");
    }
}
