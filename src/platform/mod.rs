pub mod twitch;

use anyhow::Result;
use async_trait::async_trait;

/// A chat message received from the stream
#[derive(Debug, Clone)]
pub struct ChatEvent {
    /// Channel the message was posted in
    pub channel: String,
    /// Display name of the sender
    pub sender: String,
    /// The message text
    pub text: String,
}

/// Outbound side of a chat connection.
#[async_trait]
pub trait ChatSink: Send + Sync {
    async fn say(&self, channel: &str, text: &str) -> Result<()>;
}
