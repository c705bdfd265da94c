//! Admin authentication. Handlers ask for an [`AdminSession`]; how a session is
//! recognised is decided by the [`SessionProvider`] stored in [`AppState`].

use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    extract::FromRequestParts,
    http::{HeaderMap, header, request::Parts},
};
use reqwest::Client;
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, warn};

use crate::{app_error::AppError, app_state::AppState, config::SessionConfig};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdminSession {
    /// Email or token label of the authenticated staff member.
    pub subject: String,
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("session provider is unreachable: {0}")]
    Unreachable(String),
}

#[async_trait]
pub trait SessionProvider: Send + Sync {
    /// `Ok(None)` means the request carries no valid admin session.
    async fn authenticate(&self, headers: &HeaderMap) -> Result<Option<AdminSession>, SessionError>;
}

impl FromRequestParts<AppState> for AdminSession {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        match state.sessions.authenticate(&parts.headers).await {
            Ok(Some(session)) => {
                debug!(subject = %session.subject, "Admin session accepted");
                Ok(session)
            }
            Ok(None) => Err(AppError::Unauthorized("Admin session required".into())),
            Err(e) => {
                warn!("{}", e);
                Err(AppError::ServiceUnreachable("Session provider".into()))
            }
        }
    }
}

/// Forwards the request's cookies to a next-auth style `/api/auth/session` endpoint.
pub struct HttpSessionProvider {
    http_client: Client,
    url: String,
}

#[derive(Deserialize)]
struct SessionBody {
    user: Option<SessionUser>,
}

#[derive(Deserialize)]
struct SessionUser {
    email: Option<String>,
    name: Option<String>,
}

impl HttpSessionProvider {
    pub fn new(http_client: Client, url: impl Into<String>) -> Self {
        Self {
            http_client,
            url: url.into(),
        }
    }
}

#[async_trait]
impl SessionProvider for HttpSessionProvider {
    async fn authenticate(&self, headers: &HeaderMap) -> Result<Option<AdminSession>, SessionError> {
        let Some(cookie) = headers.get(header::COOKIE) else {
            return Ok(None);
        };

        let res = self
            .http_client
            .get(&self.url)
            .header(header::COOKIE, cookie.clone())
            .send()
            .await
            .map_err(|e| SessionError::Unreachable(e.to_string()))?;
        if !res.status().is_success() {
            return Ok(None);
        }

        // An anonymous session is `{}`; anything unreadable is treated the same way.
        let body: SessionBody = match res.json().await {
            Ok(body) => body,
            Err(_) => return Ok(None),
        };
        Ok(body.user.map(|user| AdminSession {
            subject: user.email.or(user.name).unwrap_or_else(|| "admin".into()),
        }))
    }
}

/// Accepts `Authorization: Bearer <token>` for a fixed list of tokens.
pub struct StaticTokenProvider {
    tokens: Vec<String>,
}

impl StaticTokenProvider {
    pub fn new(tokens: Vec<String>) -> Self {
        Self { tokens }
    }
}

#[async_trait]
impl SessionProvider for StaticTokenProvider {
    async fn authenticate(&self, headers: &HeaderMap) -> Result<Option<AdminSession>, SessionError> {
        let token = headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .map(str::trim);

        Ok(token
            .filter(|token| self.tokens.iter().any(|known| known == token))
            .map(|token| AdminSession {
                subject: format!("token:{}", token.chars().take(4).collect::<String>()),
            }))
    }
}

/// Tries each provider in turn; the first session found wins.
pub struct ChainedSessionProvider {
    providers: Vec<Box<dyn SessionProvider>>,
}

#[async_trait]
impl SessionProvider for ChainedSessionProvider {
    async fn authenticate(&self, headers: &HeaderMap) -> Result<Option<AdminSession>, SessionError> {
        for provider in &self.providers {
            if let Some(session) = provider.authenticate(headers).await? {
                return Ok(Some(session));
            }
        }
        Ok(None)
    }
}

pub fn from_config(http_client: Client, config: &SessionConfig) -> Arc<dyn SessionProvider> {
    let mut providers: Vec<Box<dyn SessionProvider>> = Vec::new();
    if !config.admin_tokens.is_empty() {
        providers.push(Box::new(StaticTokenProvider::new(config.admin_tokens.clone())));
    }
    if let Some(url) = &config.provider_url {
        providers.push(Box::new(HttpSessionProvider::new(http_client, url.clone())));
    }
    if providers.is_empty() {
        warn!("No admin session provider configured; admin routes will reject every request");
    }
    Arc::new(ChainedSessionProvider { providers })
}
