//! Wires configuration into the running application: selects the LLM
//! provider, builds the agent services, and assembles the router.

use std::sync::Arc;

use axum::Router;
use sheetwise_agent::llm::ChatClient;
use sheetwise_agent::{AgentService, FormulaFlows};
use sheetwise_core::config::{AppConfig, ConfigError, ProviderKind};
use sheetwise_core::AssistError;
use sheetwise_llm::ChatCompletionsGateway;
use thiserror::Error;
use tracing::{info, warn};

use crate::api::{self, ApiState};
use crate::auth::StaticTokenVerifier;
use crate::health;

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("llm gateway startup failed: {0}")]
    Llm(#[source] AssistError),
}

pub struct Application {
    pub config: AppConfig,
    pub provider: ProviderKind,
    pub router: Router,
}

pub fn build(config: AppConfig) -> Result<Application, BootstrapError> {
    let gateway = ChatCompletionsGateway::from_config(&config.llm).map_err(BootstrapError::Llm)?;
    let provider = gateway.provider().kind;
    let model = gateway.provider().model.clone();
    info!(provider = %provider, model = %model, "llm provider selected");

    if config.auth.api_token.is_none() {
        warn!("auth.api_token is not configured; all requests will be rejected with 401");
    }

    let client: Arc<dyn ChatClient> = Arc::new(gateway);
    let state = ApiState::new(
        Arc::new(StaticTokenVerifier::new(config.auth.api_token.clone())),
        Arc::new(AgentService::new(client.clone())),
        Arc::new(FormulaFlows::new(client)),
    );

    let router = api::router(state).merge(health::router(provider, model));
    Ok(Application { config, provider, router })
}
