//! Bearer-token verification. Every route except `/health` runs through
//! this before its handler.

use async_trait::async_trait;
use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::Response;
use reqwest::Client;
use std::sync::Arc;
use subtle::ConstantTimeEq;

use super::server::AppState;
use crate::error::ApiError;

/// Verified identity of the caller, attached as a request extension.
#[derive(Debug, Clone)]
pub struct AuthedUser(pub String);

#[async_trait]
pub trait TokenVerifier: Send + Sync {
    /// Verify a bearer token and return the user id it belongs to.
    async fn verify(&self, token: &str) -> Result<String, ApiError>;
}

/// Verifies tokens against the external identity provider. The provider
/// owns sessions; we only forward the token and read back the subject.
pub struct RemoteVerifier {
    client: Client,
    verify_url: String,
}

impl RemoteVerifier {
    pub fn new(verify_url: &str) -> Self {
        Self {
            client: Client::new(),
            verify_url: verify_url.to_string(),
        }
    }
}

#[async_trait]
impl TokenVerifier for RemoteVerifier {
    async fn verify(&self, token: &str) -> Result<String, ApiError> {
        let response = self
            .client
            .get(&self.verify_url)
            .header("Authorization", format!("Bearer {token}"))
            .send()
            .await
            .map_err(|e| ApiError::Auth(format!("token verification unavailable: {e}")))?;

        if !response.status().is_success() {
            return Err(ApiError::Auth("Invalid or expired token".into()));
        }

        let body: serde_json::Value = response
            .json()
            .await
            .map_err(|_| ApiError::Auth("Invalid or expired token".into()))?;

        body.get("sub")
            .and_then(|s| s.as_str())
            .map(String::from)
            .ok_or_else(|| ApiError::Auth("Invalid or expired token".into()))
    }
}

/// Single shared secret for local deployments. All requests map to one
/// fixed subject.
pub struct SharedSecretVerifier {
    token: String,
    subject: String,
}

impl SharedSecretVerifier {
    pub fn new(token: impl Into<String>, subject: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            subject: subject.into(),
        }
    }
}

#[async_trait]
impl TokenVerifier for SharedSecretVerifier {
    async fn verify(&self, token: &str) -> Result<String, ApiError> {
        if constant_time_eq(token.as_bytes(), self.token.as_bytes()) {
            Ok(self.subject.clone())
        } else {
            Err(ApiError::Auth("Invalid or expired token".into()))
        }
    }
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.ct_eq(b).into()
}

/// Axum middleware: require a valid `Authorization: Bearer` header and
/// attach the verified user id.
pub async fn require_auth(
    State(state): State<Arc<AppState>>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let header = request
        .headers()
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| ApiError::Auth("Missing or invalid Authorization header".into()))?;

    let token = header
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| ApiError::Auth("Missing or invalid Authorization header".into()))?;

    let user_id = state.verifier.verify(token).await?;
    request.extensions_mut().insert(AuthedUser(user_id));

    Ok(next.run(request).await)
}
