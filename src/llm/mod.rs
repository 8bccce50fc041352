pub mod openai;
#[cfg(test)]
pub mod testing;

use async_trait::async_trait;

use crate::config::GenParams;
use crate::error::AppError;

// ============================================================================
// Prompt messages
// ============================================================================

/// Role of one prompt message. The chatroom's many speakers collapse to
/// exactly two conversational roles — `Agent` for the acting agent's own
/// prior lines, `Other` for everyone else (speaker identity is folded
/// into the content, see `engine::prompt::fold_speaker`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptRole {
    System,
    Agent,
    Other,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChatMessage {
    pub role: PromptRole,
    pub content: String,
}

impl ChatMessage {
    pub fn new(role: PromptRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }
}

// ============================================================================
// LanguageModel trait
// ============================================================================

/// Abstraction over the language-model service. The engine treats it as
/// an opaque capability: role-tagged messages plus generation parameters
/// in, text or a transport error out.
#[async_trait]
pub trait LanguageModel: Send + Sync {
    async fn complete(
        &self,
        messages: &[ChatMessage],
        params: GenParams,
    ) -> Result<String, AppError>;
}
