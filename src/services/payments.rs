use std::{sync::Arc, time::Duration};

use hmac::{Hmac, Mac};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use tracing::{error, info, warn};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    api::{PaymentProvider, SessionRequest},
    config::RazorpayConfig,
    domain::{OrderDetails, PaymentRecord, money::to_subunits},
    services::{OrderLifecycle, ServiceError, ServiceResult},
    store::PaymentOutcome,
};

type HmacSha256 = Hmac<Sha256>;

/// Lowercase hex HMAC-SHA256 of `"{provider_order_id}|{provider_payment_id}"`.
pub fn payment_signature(secret: &str, provider_order_id: &str, provider_payment_id: &str) -> String {
    let mut mac = match HmacSha256::new_from_slice(secret.as_bytes()) {
        Ok(mac) => mac,
        Err(_) => return String::new(),
    };
    mac.update(provider_order_id.as_bytes());
    mac.update(b"|");
    mac.update(provider_payment_id.as_bytes());
    hex::encode(mac.finalize().into_bytes())
}

/// Constant-time check of a provider-supplied signature.
pub fn signature_matches(
    secret: &str,
    provider_order_id: &str,
    provider_payment_id: &str,
    signature: &str,
) -> bool {
    let Ok(expected) = hex::decode(signature) else {
        return false;
    };
    let Ok(mut mac) = HmacSha256::new_from_slice(secret.as_bytes()) else {
        return false;
    };
    mac.update(provider_order_id.as_bytes());
    mac.update(b"|");
    mac.update(provider_payment_id.as_bytes());
    mac.verify_slice(&expected).is_ok()
}

/// What the storefront needs to open the provider's hosted checkout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutSession {
    /// Provider-side order id (the payment session handle).
    pub order_id: String,
    /// Amount in the currency subunit.
    pub amount: i64,
    pub currency: String,
    /// Public key id for the client SDK.
    pub key: String,
}

/// Fields returned by the provider's client-side success callback.
#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PaymentConfirmation {
    pub order_id: Uuid,
    #[serde(alias = "razorpay_order_id")]
    pub razorpay_order_id: String,
    #[serde(alias = "razorpay_payment_id")]
    pub razorpay_payment_id: String,
    #[serde(alias = "razorpay_signature")]
    pub razorpay_signature: String,
}

pub struct PaymentBridge {
    orders: Arc<OrderLifecycle>,
    provider: Arc<dyn PaymentProvider>,
    key_id: String,
    key_secret: String,
    currency: String,
    reconcile_timeout: Duration,
}

impl PaymentBridge {
    pub fn new(
        orders: Arc<OrderLifecycle>,
        provider: Arc<dyn PaymentProvider>,
        config: &RazorpayConfig,
    ) -> Self {
        Self {
            orders,
            provider,
            key_id: config.key_id.clone(),
            key_secret: config.key_secret.clone(),
            currency: config.currency.clone(),
            reconcile_timeout: config.reconcile_timeout,
        }
    }

    /// Opens a hosted payment session for an unpaid order. `amount` is in rupees and
    /// must equal the order's final amount.
    pub async fn initiate(&self, order_id: Uuid, amount: Decimal) -> ServiceResult<CheckoutSession> {
        let details = self.orders.get(order_id).await?;
        let order = &details.order;

        if order.is_paid() {
            return Err(ServiceError::Validation("order is already paid".into()));
        }
        if order.status.is_terminal() {
            return Err(ServiceError::Validation(format!(
                "order is {} and can no longer be paid",
                order.status
            )));
        }
        if amount != order.final_amount {
            return Err(ServiceError::AmountMismatch {
                expected: order.final_amount,
                actual: amount,
            });
        }
        let subunits = to_subunits(order.final_amount).ok_or_else(|| {
            ServiceError::Validation(format!(
                "amount {} cannot be charged in {}",
                order.final_amount, self.currency
            ))
        })?;

        let request = SessionRequest {
            amount: subunits,
            currency: self.currency.clone(),
            receipt: order_id.to_string(),
        };
        let session = self.provider.create_session(&request).await.map_err(|e| {
            error!(
                target: "payments::provider",
                order_id = %order_id,
                provider = self.provider.name(),
                "Payment session could not be created: {}", e
            );
            ServiceError::PaymentProvider(e.to_string())
        })?;

        self.orders.attach_payment_session(order_id, &session.id).await?;

        info!(
            order_id = %order_id,
            provider_order_id = %session.id,
            amount = session.amount,
            "Payment session created"
        );
        Ok(CheckoutSession {
            order_id: session.id,
            amount: session.amount,
            currency: session.currency,
            key: self.key_id.clone(),
        })
    }

    /// Checks the callback signature and records the payment. Repeating a verified
    /// callback returns the paid order without writing or notifying again.
    pub async fn verify(&self, confirmation: PaymentConfirmation) -> ServiceResult<OrderDetails> {
        let PaymentConfirmation {
            order_id,
            razorpay_order_id: provider_order_id,
            razorpay_payment_id: provider_payment_id,
            razorpay_signature: signature,
        } = confirmation;

        let details = self.orders.get(order_id).await?;

        if !signature_matches(&self.key_secret, &provider_order_id, &provider_payment_id, &signature)
        {
            warn!(
                target: "payments::tamper",
                order_id = %order_id,
                provider_order_id = %provider_order_id,
                provider_payment_id = %provider_payment_id,
                "Payment signature mismatch"
            );
            return Err(ServiceError::SignatureMismatch);
        }
        if details.order.provider_order_id.as_deref() != Some(provider_order_id.as_str()) {
            warn!(
                target: "payments::tamper",
                order_id = %order_id,
                provider_order_id = %provider_order_id,
                expected = ?details.order.provider_order_id,
                "Signed payment belongs to a different payment session"
            );
            return Err(ServiceError::SignatureMismatch);
        }

        let record = PaymentRecord {
            provider_payment_id: provider_payment_id.clone(),
            payment_method: self.provider.name().to_string(),
        };
        let reconciled = tokio::time::timeout(
            self.reconcile_timeout,
            self.orders.reconcile_payment(order_id, &record),
        )
        .await;

        let reason = match reconciled {
            Ok(Ok(PaymentOutcome::Recorded(details))) => {
                info!(
                    order_id = %order_id,
                    provider_payment_id = %provider_payment_id,
                    "Payment verified and recorded"
                );
                return Ok(details);
            }
            Ok(Ok(PaymentOutcome::AlreadyPaid(details))) => {
                info!(order_id = %order_id, "Payment already recorded");
                return Ok(details);
            }
            Ok(Err(e)) => e.to_string(),
            Err(_) => format!("timed out after {:?}", self.reconcile_timeout),
        };

        error!(
            target: "payments::reconciliation",
            order_id = %order_id,
            provider_order_id = %provider_order_id,
            provider_payment_id = %provider_payment_id,
            reason = %reason,
            "Payment captured but not recorded; manual reconciliation required"
        );
        Err(ServiceError::ReconciliationAmbiguous {
            order_id,
            provider_order_id,
            provider_payment_id,
            reason,
        })
    }
}
