use crate::core::IdentityProvider;
use crate::models::UserId;
use actix_web::http::header::AUTHORIZATION;
use actix_web::HttpRequest;
use async_trait::async_trait;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Audience carried by user access tokens
pub const AUTHENTICATED_AUDIENCE: &str = "authenticated";

/// Errors that can occur while resolving an access token
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("HTTP request failed: {0}")]
    RequestError(#[from] reqwest::Error),

    #[error("Invalid token: {0}")]
    InvalidToken(#[from] jsonwebtoken::errors::Error),

    #[error("Unauthorized: token rejected by auth server")]
    Unauthorized,

    #[error("Auth server returned error: {0}")]
    ApiError(String),

    #[error("Token has an empty subject")]
    EmptySubject,
}

/// Turns a bearer token into a user identity
#[async_trait]
pub trait TokenResolver: Send + Sync {
    async fn resolve(&self, token: &str) -> Result<UserId, AuthError>;
}

#[derive(Debug, Deserialize)]
struct Claims {
    sub: String,
}

/// Verifies HS256 access tokens locally with the project's JWT secret
pub struct JwtVerifier {
    key: DecodingKey,
    validation: Validation,
}

impl JwtVerifier {
    pub fn new(secret: &str) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_audience(&[AUTHENTICATED_AUDIENCE]);

        Self {
            key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
        }
    }
}

#[async_trait]
impl TokenResolver for JwtVerifier {
    async fn resolve(&self, token: &str) -> Result<UserId, AuthError> {
        let data = decode::<Claims>(token, &self.key, &self.validation)?;
        UserId::parse(data.claims.sub).ok_or(AuthError::EmptySubject)
    }
}

#[derive(Debug, Deserialize)]
struct AuthUser {
    id: String,
}

/// Resolves tokens by asking the auth server who they belong to
///
/// Calls `GET {base_url}/auth/v1/user` with the anon key and the bearer token.
pub struct SupabaseAuthClient {
    base_url: String,
    anon_key: String,
    client: Client,
}

impl SupabaseAuthClient {
    pub fn new(base_url: String, anon_key: String, timeout: Duration) -> Result<Self, AuthError> {
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            base_url,
            anon_key,
            client,
        })
    }
}

#[async_trait]
impl TokenResolver for SupabaseAuthClient {
    async fn resolve(&self, token: &str) -> Result<UserId, AuthError> {
        let url = format!("{}/auth/v1/user", self.base_url.trim_end_matches('/'));

        let response = self
            .client
            .get(&url)
            .header("apikey", &self.anon_key)
            .bearer_auth(token)
            .send()
            .await?;

        match response.status() {
            status if status.is_success() => {}
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => return Err(AuthError::Unauthorized),
            status => {
                return Err(AuthError::ApiError(format!("Failed to resolve user: {}", status)));
            }
        }

        let user: AuthUser = response.json().await?;
        UserId::parse(user.id).ok_or(AuthError::EmptySubject)
    }
}

/// Identity of the caller behind one HTTP request
pub struct RequestIdentity {
    token: Option<String>,
    resolver: Arc<dyn TokenResolver>,
}

impl RequestIdentity {
    pub fn new(token: Option<String>, resolver: Arc<dyn TokenResolver>) -> Self {
        Self { token, resolver }
    }

    pub fn from_request(req: &HttpRequest, resolver: Arc<dyn TokenResolver>) -> Self {
        Self::new(bearer_token(req), resolver)
    }
}

#[async_trait]
impl IdentityProvider for RequestIdentity {
    async fn current_user(&self) -> Option<UserId> {
        let token = self.token.as_deref()?;

        match self.resolver.resolve(token).await {
            Ok(user) => Some(user),
            Err(AuthError::RequestError(e)) => {
                tracing::warn!("Auth server unreachable: {}", e);
                None
            }
            Err(e) => {
                tracing::debug!("Rejected access token: {}", e);
                None
            }
        }
    }
}

/// Extract the token from an `Authorization: Bearer <token>` header
pub fn bearer_token(req: &HttpRequest) -> Option<String> {
    let value = req.headers().get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.trim().split_once(' ')?;

    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }

    let token = token.trim();
    if token.is_empty() {
        None
    } else {
        Some(token.to_string())
    }
}
