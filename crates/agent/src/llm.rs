use async_trait::async_trait;
use serde::Serialize;
use sheetwise_core::AssistError;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// One turn in a chat-completion request, serialized in the
/// OpenAI-compatible `{role, content}` shape every configured provider
/// accepts.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self { role: Role::System, content: content.into() }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self { role: Role::User, content: content.into() }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self { role: Role::Assistant, content: content.into() }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct CompletionOptions {
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
}

/// An interface for sending chat-style prompts to an LLM and receiving
/// the assistant's text reply.
///
/// Implementors encapsulate transport, serialization, and
/// vendor-specific API details; consumers remain decoupled from any
/// particular provider or HTTP client library.
#[async_trait]
pub trait ChatClient: Send + Sync {
    async fn complete(
        &self,
        messages: &[ChatMessage],
        options: &CompletionOptions,
    ) -> Result<String, AssistError>;
}

#[cfg(test)]
mod tests {
    use super::ChatMessage;

    #[test]
    fn messages_serialize_with_lowercase_roles() {
        let message = ChatMessage::system("You are an Excel assistant.");
        let encoded = serde_json::to_value(&message).expect("serialize");
        assert_eq!(encoded["role"], "system");
        assert_eq!(encoded["content"], "You are an Excel assistant.");
    }
}
