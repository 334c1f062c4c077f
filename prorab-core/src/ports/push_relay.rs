//! Push relay port - outbound text messages to a chat service

use async_trait::async_trait;

use crate::domain::result::Result;

/// Delivers a text message to an external chat service
#[async_trait]
pub trait PushRelay: Send + Sync {
    /// Relay name (e.g., "telegram")
    fn name(&self) -> &str;

    /// Deliver one message
    async fn send(&self, text: &str) -> Result<()>;
}
