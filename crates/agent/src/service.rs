use std::sync::Arc;

use chrono::Utc;
use sheetwise_core::domain::{ChatRequest, ChatResponse};
use sheetwise_core::AssistError;
use tracing::warn;

use crate::composer::compose;
use crate::llm::{ChatClient, ChatMessage, CompletionOptions};

const SYSTEM_PROMPT: &str = "你是一个专业的Excel AI助手。你可以帮助用户：

1. 理解和解释Excel公式
2. 生成Excel公式
3. 读取和分析Excel数据
4. 创建图表和可视化
5. 提供Excel操作指导

请根据用户需求，提供准确的帮助和指导。";

const FAILURE_REPLY: &str = "抱歉，处理您的请求时出现了错误。";

/// Chat entry point: one LLM call for the conversational reply, one
/// independent keyword scan of the raw user message. The two results
/// are concatenated into a single envelope; the scan never reads the
/// reply and the reply never selects operations.
pub struct AgentService {
    client: Arc<dyn ChatClient>,
}

impl AgentService {
    pub fn new(client: Arc<dyn ChatClient>) -> Self {
        Self { client }
    }

    /// Never fails past this boundary: any gateway error becomes a
    /// `success: false` envelope with the error text attached.
    pub async fn chat(&self, request: ChatRequest) -> ChatResponse {
        let conversation_id = request
            .conversation_id
            .clone()
            .or_else(|| Some(format!("conv_{}", Utc::now().timestamp_millis())));

        match self.reply(&request.message).await {
            Ok(reply) => ChatResponse {
                success: true,
                response: reply,
                excel_operations: compose(&request.message),
                conversation_id,
                error: None,
            },
            Err(error) => {
                warn!(error = %error, "chat completion failed");
                ChatResponse {
                    success: false,
                    response: FAILURE_REPLY.to_string(),
                    excel_operations: Vec::new(),
                    conversation_id,
                    error: Some(error.to_string()),
                }
            }
        }
    }

    async fn reply(&self, message: &str) -> Result<String, AssistError> {
        let messages = [ChatMessage::system(SYSTEM_PROMPT), ChatMessage::user(message)];
        let options = CompletionOptions { temperature: Some(0.1), max_tokens: Some(1500) };
        self.client.complete(&messages, &options).await
    }
}
