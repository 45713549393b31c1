use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use sheetwise_agent::llm::{ChatClient, ChatMessage, CompletionOptions};
use sheetwise_core::config::{LlmConfig, ProviderKind};
use sheetwise_core::AssistError;
use tracing::{debug, warn};

/// The provider that won the startup probe. Immutable for the process
/// lifetime.
#[derive(Clone, Debug)]
pub struct SelectedProvider {
    pub kind: ProviderKind,
    pub endpoint_url: String,
    pub model: String,
    api_key: SecretString,
}

/// Probe configured credentials in priority order and pick the first
/// usable one. A key equal to the shipping placeholder does not count.
pub fn select_provider(config: &LlmConfig) -> Result<SelectedProvider, AssistError> {
    for kind in ProviderKind::PRIORITY {
        let provider = config.provider(kind);
        if !provider.has_usable_key() {
            continue;
        }
        let Some(api_key) = provider.api_key.clone() else {
            continue;
        };
        return Ok(SelectedProvider {
            kind,
            endpoint_url: provider.endpoint_url.clone(),
            model: provider.model.clone(),
            api_key,
        });
    }

    Err(AssistError::Configuration(
        "no usable llm api key found; set DASHSCOPE_API_KEY, DEEPSEEK_API_KEY, or OPENAI_API_KEY"
            .to_string(),
    ))
}

pub struct ChatCompletionsGateway {
    client: Client,
    provider: SelectedProvider,
    timeout: Duration,
}

impl ChatCompletionsGateway {
    pub fn from_config(config: &LlmConfig) -> Result<Self, AssistError> {
        let provider = select_provider(config)?;
        debug!(
            provider = %provider.kind,
            model = %provider.model,
            "llm gateway initialized"
        );
        Ok(Self { client: Client::new(), provider, timeout: Duration::from_secs(config.timeout_secs) })
    }

    pub fn provider(&self) -> &SelectedProvider {
        &self.provider
    }
}

#[async_trait]
impl ChatClient for ChatCompletionsGateway {
    async fn complete(
        &self,
        messages: &[ChatMessage],
        options: &CompletionOptions,
    ) -> Result<String, AssistError> {
        let request = ChatCompletionRequest {
            model: &self.provider.model,
            messages,
            temperature: options.temperature,
            max_tokens: options.max_tokens,
            stream: false,
        };

        let response = self
            .client
            .post(&self.provider.endpoint_url)
            .bearer_auth(self.provider.api_key.expose_secret())
            .json(&request)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|error| {
                warn!(provider = %self.provider.kind, error = %error, "llm request failed");
                AssistError::connection(format!(
                    "could not reach {} api: {error}",
                    self.provider.kind
                ))
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(AssistError::connection_with_status(
                format!("{} api returned {status}", self.provider.kind),
                status.as_u16(),
            ));
        }

        let reply: ChatCompletionReply = response.json().await.map_err(|error| {
            AssistError::ResponseFormat(format!(
                "could not decode {} reply body: {error}",
                self.provider.kind
            ))
        })?;

        first_reply_content(reply)
    }
}

#[derive(Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    stream: bool,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionReply {
    #[serde(default)]
    choices: Vec<ReplyChoice>,
}

#[derive(Debug, Deserialize)]
struct ReplyChoice {
    message: ReplyMessage,
}

#[derive(Debug, Deserialize)]
struct ReplyMessage {
    #[serde(default)]
    content: String,
}

fn first_reply_content(reply: ChatCompletionReply) -> Result<String, AssistError> {
    reply.choices.into_iter().next().map(|choice| choice.message.content).ok_or_else(|| {
        AssistError::ResponseFormat("provider reply contained no choices".to_string())
    })
}
