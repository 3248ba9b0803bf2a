use serde::{Deserialize, Serialize};
use validator::Validate;

/// Maximum accepted length of one chat message, in characters
pub const MAX_MESSAGE_CHARS: u64 = 4000;

/// Frame sent by the chat client over the WebSocket
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct InboundFrame {
    #[serde(default)]
    #[validate(length(max = MAX_MESSAGE_CHARS))]
    pub message: String,
}

impl InboundFrame {
    /// Message text with surrounding whitespace removed, `None` when blank
    pub fn text(&self) -> Option<&str> {
        let trimmed = self.message.trim();
        (!trimmed.is_empty()).then_some(trimmed)
    }
}
