use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::RazorpayConfig;

pub const PROVIDER_NAME: &str = "razorpay";

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("payment provider is unreachable: {0}")]
    Unreachable(String),

    #[error("payment provider rejected the request ({status}): {body}")]
    Rejected { status: u16, body: String },

    #[error("payment provider returned an unreadable response: {0}")]
    Malformed(String),
}

/// Hosted-checkout session request. `amount` is in the currency subunit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionRequest {
    pub amount: i64,
    pub currency: String,
    pub receipt: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PaymentSession {
    pub id: String,
    pub amount: i64,
    pub currency: String,
}

#[async_trait]
pub trait PaymentProvider: Send + Sync {
    fn name(&self) -> &'static str;

    async fn create_session(&self, request: &SessionRequest) -> Result<PaymentSession, ProviderError>;
}

/// Razorpay Orders API client (`POST /orders`, basic auth with key id and secret).
#[derive(Clone)]
pub struct RazorpayClient {
    http_client: Client,
    api_url: String,
    key_id: String,
    key_secret: String,
}

impl RazorpayClient {
    pub fn new(http_client: Client, config: &RazorpayConfig) -> Self {
        Self {
            http_client,
            api_url: config.api_url.trim_end_matches('/').to_string(),
            key_id: config.key_id.clone(),
            key_secret: config.key_secret.clone(),
        }
    }
}

#[async_trait]
impl PaymentProvider for RazorpayClient {
    fn name(&self) -> &'static str {
        PROVIDER_NAME
    }

    async fn create_session(&self, request: &SessionRequest) -> Result<PaymentSession, ProviderError> {
        let res = self
            .http_client
            .post(format!("{}/orders", self.api_url))
            .basic_auth(&self.key_id, Some(&self.key_secret))
            .json(request)
            .send()
            .await
            .map_err(|e| ProviderError::Unreachable(e.to_string()))?;

        let status = res.status();
        if !status.is_success() {
            let body = res.text().await.unwrap_or_default();
            return Err(ProviderError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        res.json::<PaymentSession>()
            .await
            .map_err(|e| ProviderError::Malformed(e.to_string()))
    }
}
