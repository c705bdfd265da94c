use anyhow::{Context, Result};
use async_trait::async_trait;
use lapin::{
    BasicProperties, Channel, Connection, ConnectionProperties,
    options::{BasicPublishOptions, QueueDeclareOptions},
    types::FieldTable,
};
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::info;
use uuid::Uuid;

use crate::{
    domain::{OrderDetails, OrderStatus},
    notifications::{Notifier, recipient},
};

/// Publishes notification requests to a durable queue for an external mailer.
pub struct AmqpNotifier {
    _connection: Connection,
    channel: Channel,
    queue: String,
}

/// Message published for each notification.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationMessage<'a> {
    pub kind: &'static str,
    pub order_id: Uuid,
    pub order_number: &'a str,
    pub recipient: String,
    pub customer_name: &'a str,
    pub final_amount: Decimal,
    pub status: OrderStatus,
    pub message: &'static str,
}

impl<'a> NotificationMessage<'a> {
    pub fn new(kind: &'static str, details: &'a OrderDetails, status: OrderStatus) -> Self {
        Self {
            kind,
            order_id: details.order.id,
            order_number: &details.order.order_number,
            recipient: recipient(details),
            customer_name: &details.order.delivery_address.name,
            final_amount: details.order.final_amount,
            status,
            message: status.customer_message(),
        }
    }
}

impl AmqpNotifier {
    pub async fn connect(url: &str, queue: &str) -> Result<Self> {
        let connection = Connection::connect(url, ConnectionProperties::default())
            .await
            .context("Failed to connect to AMQP broker")?;
        let channel = connection
            .create_channel()
            .await
            .context("Failed to open AMQP channel")?;
        channel
            .queue_declare(
                queue.into(),
                QueueDeclareOptions {
                    durable: true,
                    ..QueueDeclareOptions::default()
                },
                FieldTable::default(),
            )
            .await
            .with_context(|| format!("Failed to declare queue {queue}"))?;

        info!("Publishing notifications to queue {}", queue);
        Ok(Self {
            _connection: connection,
            channel,
            queue: queue.to_string(),
        })
    }

    async fn publish(&self, message: &NotificationMessage<'_>) -> Result<()> {
        let payload = serde_json::to_vec(message).context("Failed to encode notification")?;
        self.channel
            .basic_publish(
                "".into(),
                self.queue.as_str().into(),
                BasicPublishOptions::default(),
                &payload,
                BasicProperties::default()
                    .with_content_type("application/json".into())
                    .with_delivery_mode(2),
            )
            .await
            .context("Failed to publish notification")?
            .await
            .context("Broker did not confirm notification")?;
        Ok(())
    }
}

#[async_trait]
impl Notifier for AmqpNotifier {
    async fn order_confirmation(&self, order: &OrderDetails) -> Result<()> {
        self.publish(&NotificationMessage::new(
            "order.confirmation",
            order,
            order.order.status,
        ))
        .await
    }

    async fn status_update(&self, order: &OrderDetails, status: OrderStatus) -> Result<()> {
        self.publish(&NotificationMessage::new("order.status_update", order, status))
            .await
    }
}
