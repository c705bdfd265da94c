use std::{sync::Arc, time::Duration};

use anyhow::{Result, anyhow};
use tracing::{debug, error, info, warn};

use crate::{
    config::NotificationConfig,
    domain::OrderEvent,
    notifications::Notifier,
    store::{OutboxEntry, OutboxStatus, Store},
};

/// Polls the outbox and hands each entry to the notifier exactly once.
pub struct OutboxDispatcher {
    store: Arc<dyn Store>,
    notifier: Arc<dyn Notifier>,
    batch_size: i64,
    poll_interval: Duration,
    lease: Duration,
}

impl OutboxDispatcher {
    pub fn new(store: Arc<dyn Store>, notifier: Arc<dyn Notifier>, config: &NotificationConfig) -> Self {
        Self {
            store,
            notifier,
            batch_size: config.batch_size,
            poll_interval: config.poll_interval,
            lease: config.lease,
        }
    }

    /// Processes one batch. Returns how many entries were claimed.
    pub async fn run_once(&self) -> Result<usize> {
        let entries = self.store.claim_outbox(self.batch_size).await?;
        let claimed = entries.len();

        for entry in entries {
            let id = entry.id;
            let status = match self.deliver(&entry).await {
                Ok(()) => OutboxStatus::Sent,
                Err(e) => {
                    warn!(
                        outbox_id = id,
                        event_type = %entry.event_type,
                        "Notification failed: {:#}", e
                    );
                    OutboxStatus::Failed
                }
            };
            if let Err(e) = self.store.complete_outbox(id, status).await {
                error!(outbox_id = id, "Failed to mark outbox entry {}: {}", status.as_str(), e);
            }
        }

        if claimed > 0 {
            debug!("Dispatched {} outbox entries", claimed);
        }
        Ok(claimed)
    }

    /// Puts entries left `PROCESSING` by a crashed dispatcher back in the queue.
    pub async fn release_stale(&self) -> Result<usize> {
        let released = self.store.release_stale_outbox(self.lease).await?;
        if released > 0 {
            warn!("Released {} stale outbox entries", released);
        }
        Ok(released)
    }

    pub async fn run(self) {
        info!(
            "Outbox dispatcher started, polling every {:?}",
            self.poll_interval
        );
        let mut ticker = tokio::time::interval(self.poll_interval);
        loop {
            ticker.tick().await;
            if let Err(e) = self.release_stale().await {
                error!("Outbox lease check failed: {:#}", e);
            }
            if let Err(e) = self.run_once().await {
                error!("Outbox poll failed: {:#}", e);
            }
        }
    }

    async fn deliver(&self, entry: &OutboxEntry) -> Result<()> {
        let event = entry
            .event
            .as_ref()
            .ok_or_else(|| anyhow!("undecodable payload"))?;
        let order = self
            .store
            .find_order(event.order_id())
            .await?
            .ok_or_else(|| anyhow!("order {} no longer exists", event.order_id()))?;

        match event {
            OrderEvent::OrderConfirmation { .. } => self.notifier.order_confirmation(&order).await,
            OrderEvent::StatusUpdate { status, .. } => {
                self.notifier.status_update(&order, *status).await
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        domain::{DeliveryAddress, OrderDetails, OrderStatus},
        store::{MemoryStore, NewOrder, OrderStore, OutboxStore},
    };
    use async_trait::async_trait;
    use rust_decimal::Decimal;
    use std::sync::Mutex;
    use uuid::Uuid;

    #[derive(Default)]
    struct Flaky {
        fail: bool,
        sent: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl Notifier for Flaky {
        async fn order_confirmation(&self, order: &OrderDetails) -> Result<()> {
            if self.fail {
                return Err(anyhow!("smtp down"));
            }
            self.sent
                .lock()
                .unwrap()
                .push(format!("confirmation {}", order.order.order_number));
            Ok(())
        }

        async fn status_update(&self, _order: &OrderDetails, status: OrderStatus) -> Result<()> {
            self.sent.lock().unwrap().push(format!("status {status}"));
            Ok(())
        }
    }

    fn config() -> NotificationConfig {
        NotificationConfig {
            kind: crate::config::NotifierKind::Log,
            smtp: None,
            amqp_url: None,
            amqp_queue: "q".into(),
            poll_interval: Duration::from_millis(10),
            batch_size: 10,
            lease: Duration::from_millis(1),
        }
    }

    async fn store_with_order() -> (Arc<MemoryStore>, Uuid) {
        let store = Arc::new(MemoryStore::new());
        let id = Uuid::new_v4();
        store
            .create_order(
                NewOrder {
                    id,
                    order_number: "ORD-A-B".into(),
                    customer: DeliveryAddress {
                        name: "Ravi".into(),
                        phone: "9000000000".into(),
                        email: None,
                        address: "1 Shore Road".into(),
                        area: "Thane".into(),
                        pincode: "400601".into(),
                    },
                    items: vec![],
                    total_amount: Decimal::ZERO,
                    delivery_charge: Decimal::ZERO,
                    final_amount: Decimal::ZERO,
                    notes: None,
                },
                &[
                    OrderEvent::OrderConfirmation { order_id: id },
                    OrderEvent::StatusUpdate {
                        order_id: id,
                        status: OrderStatus::Delivered,
                    },
                ],
            )
            .await
            .unwrap();
        (store, id)
    }

    #[tokio::test]
    async fn delivered_entries_are_marked_sent() {
        let (store, _) = store_with_order().await;
        let notifier = Arc::new(Flaky::default());
        let dispatcher = OutboxDispatcher::new(store.clone(), notifier.clone(), &config());

        assert_eq!(dispatcher.run_once().await.unwrap(), 2);
        assert_eq!(dispatcher.run_once().await.unwrap(), 0);
        assert_eq!(
            *notifier.sent.lock().unwrap(),
            vec!["confirmation ORD-A-B".to_string(), "status delivered".to_string()]
        );
        assert!(
            store
                .outbox_statuses()
                .iter()
                .all(|(_, status)| *status == OutboxStatus::Sent)
        );
    }

    #[tokio::test]
    async fn entries_stranded_in_processing_are_delivered_again() {
        let (store, _) = store_with_order().await;
        let notifier = Arc::new(Flaky::default());
        let dispatcher = OutboxDispatcher::new(store.clone(), notifier.clone(), &config());

        // Claimed by a dispatcher that died before completing them.
        assert_eq!(store.claim_outbox(10).await.unwrap().len(), 2);
        assert_eq!(dispatcher.run_once().await.unwrap(), 0);

        tokio::time::sleep(Duration::from_millis(5)).await;
        assert_eq!(dispatcher.release_stale().await.unwrap(), 2);
        assert_eq!(dispatcher.run_once().await.unwrap(), 2);
        assert_eq!(notifier.sent.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn failures_are_recorded_and_not_retried() {
        let (store, _) = store_with_order().await;
        let notifier = Arc::new(Flaky {
            fail: true,
            ..Default::default()
        });
        let dispatcher = OutboxDispatcher::new(store.clone(), notifier, &config());

        dispatcher.run_once().await.unwrap();
        assert_eq!(
            store.outbox_statuses(),
            vec![
                ("order.confirmation".to_string(), OutboxStatus::Failed),
                ("order.status_update".to_string(), OutboxStatus::Sent),
            ]
        );
        assert_eq!(dispatcher.run_once().await.unwrap(), 0);
    }
}
