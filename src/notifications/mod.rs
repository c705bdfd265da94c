//! Customer notifications. Order mutations only write outbox rows; the
//! [`OutboxDispatcher`] delivers them later through a [`Notifier`].

pub mod amqp;
pub mod dispatcher;
pub mod email;

use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use tracing::info;

use crate::{
    config::{NotificationConfig, NotifierKind},
    domain::{OrderDetails, OrderStatus},
};

pub use amqp::AmqpNotifier;
pub use dispatcher::OutboxDispatcher;
pub use email::SmtpNotifier;

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn order_confirmation(&self, order: &OrderDetails) -> Result<()>;

    async fn status_update(&self, order: &OrderDetails, status: OrderStatus) -> Result<()>;
}

/// Writes notifications to the log instead of delivering them.
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn order_confirmation(&self, order: &OrderDetails) -> Result<()> {
        info!(
            order_number = %order.order.order_number,
            recipient = %recipient(order),
            "Order confirmation"
        );
        Ok(())
    }

    async fn status_update(&self, order: &OrderDetails, status: OrderStatus) -> Result<()> {
        info!(
            order_number = %order.order.order_number,
            recipient = %recipient(order),
            status = %status,
            "{}", status.customer_message()
        );
        Ok(())
    }
}

/// Customer email from the order snapshot, or a phone-based placeholder address.
pub fn recipient(order: &OrderDetails) -> String {
    let address = &order.order.delivery_address;
    match &address.email {
        Some(email) => email.clone(),
        None => format!("{}@example.com", address.phone),
    }
}

pub async fn from_config(config: &NotificationConfig) -> Result<Arc<dyn Notifier>> {
    let notifier: Arc<dyn Notifier> = match config.kind {
        NotifierKind::Log => Arc::new(LogNotifier),
        NotifierKind::Smtp => {
            let smtp = config.smtp.as_ref().context("SMTP settings are missing")?;
            Arc::new(SmtpNotifier::new(smtp)?)
        }
        NotifierKind::Amqp => {
            let url = config.amqp_url.as_deref().context("AMQP_URL must be set")?;
            Arc::new(AmqpNotifier::connect(url, &config.amqp_queue).await?)
        }
    };
    Ok(notifier)
}
