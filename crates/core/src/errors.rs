use thiserror::Error;

/// Failures shared by the LLM gateway, the chat service, and the four
/// formula flows. Mapped to HTTP statuses exactly once, at the server
/// boundary.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum AssistError {
    /// No usable provider credential was found, or the placeholder key
    /// was left unchanged. Fatal at startup for any path that needs the
    /// LLM.
    #[error("llm provider not configured: {0}")]
    Configuration(String),
    /// Transport failure or non-success HTTP status from the provider.
    /// Never retried automatically.
    #[error("llm provider unreachable: {message}")]
    Connection { message: String, status: Option<u16> },
    /// The provider reply was missing expected structure (no choices)
    /// or failed a required line-prefix parse.
    #[error("llm reply did not match the expected format: {0}")]
    ResponseFormat(String),
    /// The model explicitly reported it could not produce a formula.
    /// Surfaced verbatim.
    #[error("{0}")]
    Generation(String),
}

impl AssistError {
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection { message: message.into(), status: None }
    }

    pub fn connection_with_status(message: impl Into<String>, status: u16) -> Self {
        Self::Connection { message: message.into(), status: Some(status) }
    }
}
