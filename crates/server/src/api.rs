//! HTTP surface: the chat endpoint plus the four formula endpoints.
//!
//! Every route requires a bearer token. The chat route always answers
//! 200 with a success flag inside the envelope; the formula routes map
//! upstream failures to `{"detail": ...}` error bodies.

use std::sync::Arc;

use axum::extract::State;
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use serde::Serialize;
use sheetwise_agent::{AgentService, FormulaFlows};
use sheetwise_core::domain::{
    ChatRequest, ChatResponse, DiagnoseErrorRequest, DiagnoseErrorResponse, ExplainFormulaRequest,
    ExplainFormulaResponse, FormulaResponse, NlToFormulaRequest, OptimizeFormulaRequest,
    OptimizeFormulaResponse,
};
use sheetwise_core::AssistError;
use tracing::info;

use crate::auth::{bearer_token, Principal, TokenVerifier};

#[derive(Clone)]
pub struct ApiState {
    verifier: Arc<dyn TokenVerifier>,
    agent: Arc<AgentService>,
    formulas: Arc<FormulaFlows>,
}

impl ApiState {
    pub fn new(
        verifier: Arc<dyn TokenVerifier>,
        agent: Arc<AgentService>,
        formulas: Arc<FormulaFlows>,
    ) -> Self {
        Self { verifier, agent, formulas }
    }
}

pub fn router(state: ApiState) -> Router {
    Router::new()
        .route("/agent/chat", post(agent_chat))
        .route("/api/generate-formula", post(generate_formula))
        .route("/api/explain-formula", post(explain_formula))
        .route("/api/optimize-formula", post(optimize_formula))
        .route("/api/diagnose-error", post(diagnose_error))
        .with_state(state)
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    detail: String,
}

enum ApiFailure {
    Unauthorized,
    Upstream(AssistError),
}

impl From<AssistError> for ApiFailure {
    fn from(error: AssistError) -> Self {
        Self::Upstream(error)
    }
}

impl IntoResponse for ApiFailure {
    fn into_response(self) -> Response {
        match self {
            Self::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                [(header::WWW_AUTHENTICATE, "Bearer")],
                Json(ErrorBody { detail: "Could not validate credentials".to_string() }),
            )
                .into_response(),
            Self::Upstream(error) => {
                let status = match &error {
                    AssistError::Connection { .. } | AssistError::ResponseFormat(_) => {
                        StatusCode::BAD_GATEWAY
                    }
                    AssistError::Configuration(_) | AssistError::Generation(_) => {
                        StatusCode::INTERNAL_SERVER_ERROR
                    }
                };
                (status, Json(ErrorBody { detail: error.to_string() })).into_response()
            }
        }
    }
}

async fn authenticate(state: &ApiState, headers: &HeaderMap) -> Result<Principal, ApiFailure> {
    let token = bearer_token(headers).ok_or(ApiFailure::Unauthorized)?;
    state.verifier.verify(token).await.map_err(|_| ApiFailure::Unauthorized)
}

async fn agent_chat(
    State(state): State<ApiState>,
    headers: HeaderMap,
    Json(request): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, ApiFailure> {
    let principal = authenticate(&state, &headers).await?;
    info!(subject = %principal.subject, "chat request accepted");
    Ok(Json(state.agent.chat(request).await))
}

async fn generate_formula(
    State(state): State<ApiState>,
    headers: HeaderMap,
    Json(request): Json<NlToFormulaRequest>,
) -> Result<Json<FormulaResponse>, ApiFailure> {
    authenticate(&state, &headers).await?;
    Ok(Json(state.formulas.generate(&request.text).await?))
}

async fn explain_formula(
    State(state): State<ApiState>,
    headers: HeaderMap,
    Json(request): Json<ExplainFormulaRequest>,
) -> Result<Json<ExplainFormulaResponse>, ApiFailure> {
    authenticate(&state, &headers).await?;
    Ok(Json(state.formulas.explain(&request.formula).await?))
}

async fn optimize_formula(
    State(state): State<ApiState>,
    headers: HeaderMap,
    Json(request): Json<OptimizeFormulaRequest>,
) -> Result<Json<OptimizeFormulaResponse>, ApiFailure> {
    authenticate(&state, &headers).await?;
    Ok(Json(state.formulas.optimize(&request.formula).await?))
}

async fn diagnose_error(
    State(state): State<ApiState>,
    headers: HeaderMap,
    Json(request): Json<DiagnoseErrorRequest>,
) -> Result<Json<DiagnoseErrorResponse>, ApiFailure> {
    authenticate(&state, &headers).await?;
    Ok(Json(state.formulas.diagnose(&request.formula).await?))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use axum::Router;
    use serde_json::{json, Value};
    use sheetwise_agent::llm::{ChatClient, ChatMessage, CompletionOptions};
    use sheetwise_agent::{AgentService, FormulaFlows};
    use sheetwise_core::AssistError;
    use tower::ServiceExt;

    use super::{router, ApiState};
    use crate::auth::StaticTokenVerifier;

    const TEST_TOKEN: &str = "sw-test-token";

    struct ScriptedClient {
        reply: Result<String, AssistError>,
    }

    #[async_trait]
    impl ChatClient for ScriptedClient {
        async fn complete(
            &self,
            _messages: &[ChatMessage],
            _options: &CompletionOptions,
        ) -> Result<String, AssistError> {
            self.reply.clone()
        }
    }

    fn app(reply: Result<String, AssistError>) -> Router {
        let client: Arc<dyn ChatClient> = Arc::new(ScriptedClient { reply });
        let verifier = Arc::new(StaticTokenVerifier::new(Some(TEST_TOKEN.to_string().into())));
        let state = ApiState::new(
            verifier,
            Arc::new(AgentService::new(client.clone())),
            Arc::new(FormulaFlows::new(client)),
        );
        router(state)
    }

    async fn post_json(
        app: Router,
        path: &str,
        token: Option<&str>,
        body: Value,
    ) -> (StatusCode, axum::http::HeaderMap, Value) {
        let mut builder =
            Request::builder().method("POST").uri(path).header("content-type", "application/json");
        if let Some(token) = token {
            builder = builder.header("authorization", format!("Bearer {token}"));
        }
        let request = builder.body(Body::from(body.to_string())).expect("request");

        let response = app.oneshot(request).await.expect("response");
        let status = response.status();
        let headers = response.headers().clone();
        let bytes =
            axum::body::to_bytes(response.into_body(), usize::MAX).await.expect("body bytes");
        let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, headers, value)
    }

    #[tokio::test]
    async fn missing_token_is_rejected_with_a_challenge() {
        let (status, headers, body) = post_json(
            app(Ok("hi".to_string())),
            "/agent/chat",
            None,
            json!({"message": "帮我求和"}),
        )
        .await;

        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(headers.get("www-authenticate").expect("challenge"), "Bearer");
        assert_eq!(body["detail"], "Could not validate credentials");
    }

    #[tokio::test]
    async fn wrong_token_is_rejected() {
        let (status, _, _) = post_json(
            app(Ok("hi".to_string())),
            "/api/generate-formula",
            Some("not-the-token"),
            json!({"text": "sum column A"}),
        )
        .await;

        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn chat_returns_the_full_envelope() {
        let (status, _, body) = post_json(
            app(Ok("好的，我来帮您做对账分析。".to_string())),
            "/agent/chat",
            Some(TEST_TOKEN),
            json!({"message": "帮我做一个对账表", "conversation_id": "conv_9"}),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
        assert_eq!(body["conversation_id"], "conv_9");
        assert_eq!(body["excel_operations"][0]["operation_type"], "reconciliation_analysis");
        assert!(body.get("error").is_none());
    }

    #[tokio::test]
    async fn chat_failure_still_answers_200() {
        let (status, _, body) = post_json(
            app(Err(AssistError::connection("connect timeout"))),
            "/agent/chat",
            Some(TEST_TOKEN),
            json!({"message": "帮我做一个对账表"}),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], false);
        assert_eq!(body["response"], "抱歉，处理您的请求时出现了错误。");
        assert!(body["error"].as_str().expect("error text").contains("connect timeout"));
    }

    #[tokio::test]
    async fn generate_formula_happy_path() {
        let (status, _, body) = post_json(
            app(Ok("=SUM(A1:A10)".to_string())),
            "/api/generate-formula",
            Some(TEST_TOKEN),
            json!({"text": "sum A1 to A10"}),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["formula"], "=SUM(A1:A10)");
    }

    #[tokio::test]
    async fn model_reported_generation_error_is_a_500_with_the_exact_text() {
        let (status, _, body) = post_json(
            app(Ok("Error: Could not generate formula.".to_string())),
            "/api/generate-formula",
            Some(TEST_TOKEN),
            json!({"text": "gibberish"}),
        )
        .await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["detail"], "Error: Could not generate formula.");
    }

    #[tokio::test]
    async fn unparseable_optimization_reply_is_a_bad_gateway() {
        let (status, _, body) = post_json(
            app(Ok("no labelled lines here".to_string())),
            "/api/optimize-formula",
            Some(TEST_TOKEN),
            json!({"formula": "=SUM(A1:A10)"}),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert!(body["detail"].as_str().expect("detail").contains("Optimized Formula"));
    }

    #[tokio::test]
    async fn upstream_connection_failure_is_a_bad_gateway() {
        let (status, _, body) = post_json(
            app(Err(AssistError::connection_with_status("deepseek api returned 503", 503))),
            "/api/explain-formula",
            Some(TEST_TOKEN),
            json!({"formula": "=SUM(A1:A10)"}),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert!(body["detail"].as_str().expect("detail").contains("503"));
    }

    #[tokio::test]
    async fn diagnose_returns_all_three_fields() {
        let reply = "Error Type: #DIV/0!\nExplanation: The divisor is zero.\nSuggested Fix: Wrap the division in IFERROR.";
        let (status, _, body) = post_json(
            app(Ok(reply.to_string())),
            "/api/diagnose-error",
            Some(TEST_TOKEN),
            json!({"formula": "=A1/B1"}),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["error_type"], "#DIV/0!");
        assert_eq!(body["explanation"], "The divisor is zero.");
        assert_eq!(body["suggested_fix"], "Wrap the division in IFERROR.");
    }
}
