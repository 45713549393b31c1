use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Shipping placeholder left in `.env` templates; a key equal to this
/// value counts as not configured.
pub const PLACEHOLDER_API_KEY: &str = "你的API_KEY";

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub auth: AuthConfig,
    pub llm: LlmConfig,
    pub logging: LoggingConfig,
}

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub bind_address: String,
    pub port: u16,
}

/// Stand-in surface for the authentication collaborator: a single
/// static API token checked against `Authorization: Bearer`.
#[derive(Clone, Debug)]
pub struct AuthConfig {
    pub api_token: Option<SecretString>,
}

#[derive(Clone, Debug)]
pub struct LlmConfig {
    pub timeout_secs: u64,
    pub dashscope: ProviderConfig,
    pub deepseek: ProviderConfig,
    pub openai: ProviderConfig,
}

/// One configured chat-completion vendor: credential, endpoint, model.
#[derive(Clone, Debug)]
pub struct ProviderConfig {
    pub api_key: Option<SecretString>,
    pub endpoint_url: String,
    pub model: String,
}

impl ProviderConfig {
    /// A key is usable when present, non-empty, and not the shipping
    /// placeholder.
    pub fn has_usable_key(&self) -> bool {
        self.api_key
            .as_ref()
            .map(|key| {
                let exposed = key.expose_secret().trim();
                !exposed.is_empty() && exposed != PLACEHOLDER_API_KEY
            })
            .unwrap_or(false)
    }
}

/// Fixed probe order: dashscope first, then deepseek, then openai.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderKind {
    Dashscope,
    Deepseek,
    OpenAi,
}

impl ProviderKind {
    pub const PRIORITY: [ProviderKind; 3] = [Self::Dashscope, Self::Deepseek, Self::OpenAi];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Dashscope => "dashscope",
            Self::Deepseek => "deepseek",
            Self::OpenAi => "openai",
        }
    }
}

impl std::fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl LlmConfig {
    pub fn provider(&self, kind: ProviderKind) -> &ProviderConfig {
        match kind {
            ProviderKind::Dashscope => &self.dashscope,
            ProviderKind::Deepseek => &self.deepseek,
            ProviderKind::OpenAi => &self.openai,
        }
    }
}

#[derive(Clone, Debug)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Compact,
    Pretty,
    Json,
}

impl std::str::FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "compact" => Ok(Self::Compact),
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(ConfigError::Validation(format!(
                "unsupported log format `{other}` (expected compact|pretty|json)"
            ))),
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    pub bind_address: Option<String>,
    pub port: Option<u16>,
    pub api_token: Option<String>,
    pub dashscope_api_key: Option<String>,
    pub deepseek_api_key: Option<String>,
    pub openai_api_key: Option<String>,
    pub llm_timeout_secs: Option<u64>,
    pub log_level: Option<String>,
    pub log_format: Option<LogFormat>,
}

#[derive(Clone, Debug, Default)]
pub struct LoadOptions {
    pub config_path: Option<PathBuf>,
    pub require_file: bool,
    pub overrides: ConfigOverrides,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file `{path}`: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("could not parse config file `{path}`: {source}")]
    ParseFile { path: PathBuf, source: toml::de::Error },
    #[error("required config file was not found: `{0}`")]
    MissingConfigFile(PathBuf),
    #[error("invalid environment override for `{key}`: `{value}`")]
    InvalidEnvOverride { key: String, value: String },
    #[error("configuration validation failed: {0}")]
    Validation(String),
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig { bind_address: "127.0.0.1".to_string(), port: 8000 },
            auth: AuthConfig { api_token: None },
            llm: LlmConfig {
                timeout_secs: 30,
                dashscope: ProviderConfig {
                    api_key: None,
                    endpoint_url:
                        "https://dashscope.aliyuncs.com/compatible-mode/v1/chat/completions"
                            .to_string(),
                    model: "qwen-turbo-latest".to_string(),
                },
                deepseek: ProviderConfig {
                    api_key: None,
                    endpoint_url: "https://api.deepseek.com/v1/chat/completions".to_string(),
                    model: "deepseek-chat".to_string(),
                },
                openai: ProviderConfig {
                    api_key: None,
                    endpoint_url: "https://api.openai.com/v1/chat/completions".to_string(),
                    model: "gpt-3.5-turbo".to_string(),
                },
            },
            logging: LoggingConfig { level: "info".to_string(), format: LogFormat::Compact },
        }
    }
}

fn secret_value(value: String) -> SecretString {
    value.into()
}

impl AppConfig {
    pub fn load(options: LoadOptions) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let maybe_path = resolve_config_path(options.config_path.as_deref());

        if let Some(path) = maybe_path {
            let patch = read_patch(&path)?;
            config.apply_patch(patch);
        } else if options.require_file {
            let expected = options.config_path.unwrap_or_else(|| PathBuf::from("sheetwise.toml"));
            return Err(ConfigError::MissingConfigFile(expected));
        }

        config.apply_env_overrides()?;
        config.apply_overrides(options.overrides);
        config.validate()?;

        Ok(config)
    }

    fn apply_patch(&mut self, patch: ConfigPatch) {
        if let Some(server) = patch.server {
            if let Some(bind_address) = server.bind_address {
                self.server.bind_address = bind_address;
            }
            if let Some(port) = server.port {
                self.server.port = port;
            }
        }

        if let Some(auth) = patch.auth {
            if let Some(api_token_value) = auth.api_token {
                self.auth.api_token = Some(secret_value(api_token_value));
            }
        }

        if let Some(llm) = patch.llm {
            if let Some(timeout_secs) = llm.timeout_secs {
                self.llm.timeout_secs = timeout_secs;
            }
            apply_provider_patch(&mut self.llm.dashscope, llm.dashscope);
            apply_provider_patch(&mut self.llm.deepseek, llm.deepseek);
            apply_provider_patch(&mut self.llm.openai, llm.openai);
        }

        if let Some(logging) = patch.logging {
            if let Some(level) = logging.level {
                self.logging.level = level;
            }
            if let Some(format) = logging.format {
                self.logging.format = format;
            }
        }
    }

    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Some(value) = read_env("SHEETWISE_SERVER_BIND_ADDRESS") {
            self.server.bind_address = value;
        }
        if let Some(value) = read_env("SHEETWISE_SERVER_PORT") {
            self.server.port = parse_u16("SHEETWISE_SERVER_PORT", &value)?;
        }
        if let Some(value) = read_env("SHEETWISE_AUTH_API_TOKEN") {
            self.auth.api_token = Some(secret_value(value));
        }
        if let Some(value) = read_env("SHEETWISE_LLM_TIMEOUT_SECS") {
            self.llm.timeout_secs = parse_u64("SHEETWISE_LLM_TIMEOUT_SECS", &value)?;
        }

        // Credential variables use the vendors' conventional names.
        if let Some(value) = read_env("DASHSCOPE_API_KEY") {
            self.llm.dashscope.api_key = Some(secret_value(value));
        }
        if let Some(value) = read_env("DASHSCOPE_API_URL") {
            self.llm.dashscope.endpoint_url = value;
        }
        if let Some(value) = read_env("QWEN_MODEL") {
            self.llm.dashscope.model = value;
        }
        if let Some(value) = read_env("DEEPSEEK_API_KEY") {
            self.llm.deepseek.api_key = Some(secret_value(value));
        }
        if let Some(value) = read_env("DEEPSEEK_API_URL") {
            self.llm.deepseek.endpoint_url = value;
        }
        if let Some(value) = read_env("OPENAI_API_KEY") {
            self.llm.openai.api_key = Some(secret_value(value));
        }

        let log_level = read_env("SHEETWISE_LOGGING_LEVEL").or_else(|| read_env("SHEETWISE_LOG_LEVEL"));
        if let Some(value) = log_level {
            self.logging.level = value;
        }
        let log_format =
            read_env("SHEETWISE_LOGGING_FORMAT").or_else(|| read_env("SHEETWISE_LOG_FORMAT"));
        if let Some(value) = log_format {
            self.logging.format = value.parse()?;
        }

        Ok(())
    }

    fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(bind_address) = overrides.bind_address {
            self.server.bind_address = bind_address;
        }
        if let Some(port) = overrides.port {
            self.server.port = port;
        }
        if let Some(api_token) = overrides.api_token {
            self.auth.api_token = Some(secret_value(api_token));
        }
        if let Some(dashscope_api_key) = overrides.dashscope_api_key {
            self.llm.dashscope.api_key = Some(secret_value(dashscope_api_key));
        }
        if let Some(deepseek_api_key) = overrides.deepseek_api_key {
            self.llm.deepseek.api_key = Some(secret_value(deepseek_api_key));
        }
        if let Some(openai_api_key) = overrides.openai_api_key {
            self.llm.openai.api_key = Some(secret_value(openai_api_key));
        }
        if let Some(llm_timeout_secs) = overrides.llm_timeout_secs {
            self.llm.timeout_secs = llm_timeout_secs;
        }
        if let Some(log_level) = overrides.log_level {
            self.logging.level = log_level;
        }
        if let Some(log_format) = overrides.log_format {
            self.logging.format = log_format;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.port == 0 {
            return Err(ConfigError::Validation(
                "server.port must be greater than zero".to_string(),
            ));
        }

        if self.llm.timeout_secs == 0 || self.llm.timeout_secs > 300 {
            return Err(ConfigError::Validation(
                "llm.timeout_secs must be in range 1..=300".to_string(),
            ));
        }

        for kind in ProviderKind::PRIORITY {
            let provider = self.llm.provider(kind);
            if provider.endpoint_url.trim().is_empty() {
                return Err(ConfigError::Validation(format!(
                    "llm.{kind}.endpoint_url must not be empty"
                )));
            }
            if provider.model.trim().is_empty() {
                return Err(ConfigError::Validation(format!("llm.{kind}.model must not be empty")));
            }
        }

        let level = self.logging.level.trim().to_ascii_lowercase();
        match level.as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => Ok(()),
            _ => Err(ConfigError::Validation(
                "logging.level must be one of trace|debug|info|warn|error".to_string(),
            )),
        }
    }
}

fn apply_provider_patch(provider: &mut ProviderConfig, patch: Option<ProviderPatch>) {
    let Some(patch) = patch else {
        return;
    };
    if let Some(api_key_value) = patch.api_key {
        provider.api_key = Some(secret_value(api_key_value));
    }
    if let Some(endpoint_url) = patch.endpoint_url {
        provider.endpoint_url = endpoint_url;
    }
    if let Some(model) = patch.model {
        provider.model = model;
    }
}

fn resolve_config_path(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        return path.exists().then_some(path.to_path_buf());
    }

    [PathBuf::from("sheetwise.toml"), PathBuf::from("config/sheetwise.toml")]
        .into_iter()
        .find(|path| path.exists())
}

fn read_patch(path: &Path) -> Result<ConfigPatch, ConfigError> {
    let raw = fs::read_to_string(path)
        .map_err(|source| ConfigError::ReadFile { path: path.to_path_buf(), source })?;

    toml::from_str::<ConfigPatch>(&raw)
        .map_err(|source| ConfigError::ParseFile { path: path.to_path_buf(), source })
}

fn read_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn parse_u16(key: &str, value: &str) -> Result<u16, ConfigError> {
    value.parse::<u16>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_u64(key: &str, value: &str) -> Result<u64, ConfigError> {
    value.parse::<u64>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

#[derive(Debug, Default, Deserialize)]
struct ConfigPatch {
    server: Option<ServerPatch>,
    auth: Option<AuthPatch>,
    llm: Option<LlmPatch>,
    logging: Option<LoggingPatch>,
}

#[derive(Debug, Default, Deserialize)]
struct ServerPatch {
    bind_address: Option<String>,
    port: Option<u16>,
}

#[derive(Debug, Default, Deserialize)]
struct AuthPatch {
    api_token: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct LlmPatch {
    timeout_secs: Option<u64>,
    dashscope: Option<ProviderPatch>,
    deepseek: Option<ProviderPatch>,
    openai: Option<ProviderPatch>,
}

#[derive(Debug, Default, Deserialize)]
struct ProviderPatch {
    api_key: Option<String>,
    endpoint_url: Option<String>,
    model: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct LoggingPatch {
    level: Option<String>,
    format: Option<LogFormat>,
}

#[cfg(test)]
mod tests {
    use std::io::Write;
    use std::path::PathBuf;

    use secrecy::ExposeSecret;

    use super::{
        AppConfig, ConfigOverrides, LoadOptions, LogFormat, ProviderKind, PLACEHOLDER_API_KEY,
    };

    fn load_with(overrides: ConfigOverrides) -> AppConfig {
        AppConfig::load(LoadOptions {
            config_path: Some(PathBuf::from("/nonexistent/sheetwise.toml")),
            overrides,
            ..LoadOptions::default()
        })
        .expect("config should load")
    }

    #[test]
    fn defaults_match_the_shipped_provider_endpoints() {
        let config = load_with(ConfigOverrides::default());

        assert_eq!(config.server.port, 8000);
        assert_eq!(config.llm.timeout_secs, 30);
        assert_eq!(
            config.llm.deepseek.endpoint_url,
            "https://api.deepseek.com/v1/chat/completions"
        );
        assert_eq!(config.llm.dashscope.model, "qwen-turbo-latest");
        assert_eq!(config.llm.openai.model, "gpt-3.5-turbo");
    }

    #[test]
    fn placeholder_key_is_not_usable() {
        let config = load_with(ConfigOverrides {
            deepseek_api_key: Some(PLACEHOLDER_API_KEY.to_string()),
            ..ConfigOverrides::default()
        });

        assert!(!config.llm.deepseek.has_usable_key());
        assert!(!config.llm.dashscope.has_usable_key());
    }

    #[test]
    fn overrides_take_precedence_over_defaults() {
        let config = load_with(ConfigOverrides {
            port: Some(9100),
            api_token: Some("sw-test-token".to_string()),
            dashscope_api_key: Some("sk-live".to_string()),
            log_format: Some(LogFormat::Json),
            ..ConfigOverrides::default()
        });

        assert_eq!(config.server.port, 9100);
        assert!(config.llm.dashscope.has_usable_key());
        assert_eq!(config.logging.format, LogFormat::Json);
        assert_eq!(
            config.auth.api_token.as_ref().map(|token| token.expose_secret().to_string()),
            Some("sw-test-token".to_string())
        );
    }

    #[test]
    fn zero_timeout_fails_validation() {
        let result = AppConfig::load(LoadOptions {
            config_path: Some(PathBuf::from("/nonexistent/sheetwise.toml")),
            overrides: ConfigOverrides {
                llm_timeout_secs: Some(0),
                ..ConfigOverrides::default()
            },
            ..LoadOptions::default()
        });

        let message = result.err().expect("validation should fail").to_string();
        assert!(message.contains("timeout_secs"));
    }

    #[test]
    fn toml_patch_overrides_provider_fields() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        writeln!(
            file,
            "[llm.deepseek]\napi_key = \"sk-from-file\"\nmodel = \"deepseek-reasoner\"\n\n[logging]\nformat = \"pretty\"\n"
        )
        .expect("write patch");

        let config = AppConfig::load(LoadOptions {
            config_path: Some(file.path().to_path_buf()),
            require_file: true,
            overrides: ConfigOverrides::default(),
        })
        .expect("config should load from file");

        assert!(config.llm.deepseek.has_usable_key());
        assert_eq!(config.llm.deepseek.model, "deepseek-reasoner");
        assert_eq!(config.logging.format, LogFormat::Pretty);
    }

    #[test]
    fn provider_priority_is_dashscope_deepseek_openai() {
        assert_eq!(
            ProviderKind::PRIORITY,
            [ProviderKind::Dashscope, ProviderKind::Deepseek, ProviderKind::OpenAi]
        );
    }
}
