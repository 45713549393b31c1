//! Bearer-token authentication seam.
//!
//! Registration, login, and user storage live in an external
//! authentication service; this module only models the check the rest
//! of the server needs: "given a bearer token, is there an
//! authenticated principal?". The static verifier is the shipped
//! implementation; swapping in a real token service means implementing
//! [`TokenVerifier`].

use async_trait::async_trait;
use axum::http::{header, HeaderMap};
use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;

/// An authenticated caller. Opaque to the agent logic; requests only
/// reach the LLM paths once one exists.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Principal {
    pub subject: String,
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum AuthError {
    #[error("could not validate credentials")]
    InvalidToken,
}

#[async_trait]
pub trait TokenVerifier: Send + Sync {
    async fn verify(&self, token: &str) -> Result<Principal, AuthError>;
}

/// Single shared API token from configuration. With no token
/// configured, every request is rejected rather than running open.
pub struct StaticTokenVerifier {
    api_token: Option<SecretString>,
}

impl StaticTokenVerifier {
    pub fn new(api_token: Option<SecretString>) -> Self {
        Self { api_token }
    }
}

#[async_trait]
impl TokenVerifier for StaticTokenVerifier {
    async fn verify(&self, token: &str) -> Result<Principal, AuthError> {
        match &self.api_token {
            Some(expected) if expected.expose_secret() == token => {
                Ok(Principal { subject: "api-token".to_string() })
            }
            _ => Err(AuthError::InvalidToken),
        }
    }
}

/// Pull the token out of `Authorization: Bearer <token>`.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers.get(header::AUTHORIZATION)?.to_str().ok()?.strip_prefix("Bearer ")
}
