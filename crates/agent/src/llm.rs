use anyhow::Result;
use async_trait::async_trait;

/// Text-completion backend. No concrete client ships with this crate.
#[async_trait]
pub trait LlmClient: Send + Sync {
    async fn complete(&self, system_prompt: &str, user_prompt: &str) -> Result<String>;
}
