use std::{collections::HashMap, sync::Arc};

use rust_decimal::Decimal;
use tracing::info;
use uuid::Uuid;
use validator::Validate;

use crate::{
    config::OrderConfig,
    domain::{
        CreateOrderInput, CustomerSummary, OrderDetails, OrderEvent, OrderPatch, OrderTransition,
        PaymentRecord, PaymentStatus, Product,
        money::{is_step_multiple, line_total, max_amount},
        order::generate_order_number,
    },
    services::{ServiceError, ServiceResult},
    store::{NewOrder, NewOrderItem, OrderFilter, PaymentOutcome, Store, StoreError},
};

/// Creates orders and records every change to them. Notifications are never sent
/// inline: each mutation writes its outbox events in the same store transaction.
pub struct OrderLifecycle {
    store: Arc<dyn Store>,
    trust_client_prices: bool,
}

impl OrderLifecycle {
    pub fn new(store: Arc<dyn Store>, config: &OrderConfig) -> Self {
        Self {
            store,
            trust_client_prices: config.trust_client_prices,
        }
    }

    pub async fn create(&self, input: CreateOrderInput) -> ServiceResult<OrderDetails> {
        input
            .validate()
            .map_err(|e| ServiceError::Validation(e.to_string()))?;

        let ids: Vec<String> = input.items.iter().map(|i| i.product_id.clone()).collect();
        let catalog: HashMap<String, Product> = self
            .store
            .find_products(&ids)
            .await?
            .into_iter()
            .map(|p| (p.id.clone(), p))
            .collect();

        let mut items = Vec::with_capacity(input.items.len());
        for line in &input.items {
            let product = catalog.get(&line.product_id).ok_or_else(|| {
                ServiceError::Validation(format!("product `{}` does not exist", line.product_id))
            })?;
            if !product.available {
                return Err(ServiceError::Validation(format!(
                    "{} is currently unavailable",
                    product.name
                )));
            }
            if !is_step_multiple(line.quantity) {
                return Err(ServiceError::Validation(format!(
                    "quantity for {} must be a positive multiple of 0.5",
                    product.name
                )));
            }
            if line.quantity < product.min_order_quantity {
                return Err(ServiceError::Validation(format!(
                    "minimum order quantity for {} is {}",
                    product.name, product.min_order_quantity
                )));
            }

            let price = if self.trust_client_prices {
                line.price
            } else {
                product.price
            };
            if price.is_sign_negative() {
                return Err(ServiceError::Validation("price must not be negative".into()));
            }

            items.push(NewOrderItem {
                product_id: line.product_id.clone(),
                quantity: line.quantity,
                price,
                total: line_total(line.quantity, price).ok_or_else(amount_too_large)?,
            });
        }

        let total_amount = items
            .iter()
            .try_fold(Decimal::ZERO, |sum, item| sum.checked_add(item.total))
            .ok_or_else(amount_too_large)?;
        let final_amount = total_amount
            .checked_add(input.delivery_charge)
            .filter(|amount| *amount <= max_amount())
            .ok_or_else(amount_too_large)?;
        let id = Uuid::new_v4();

        let order = NewOrder {
            id,
            order_number: generate_order_number(),
            customer: input.customer.to_delivery_address(),
            items,
            total_amount,
            delivery_charge: input.delivery_charge,
            final_amount,
            notes: input.notes.filter(|n| !n.trim().is_empty()),
        };

        let details = self
            .store
            .create_order(order, &[OrderEvent::OrderConfirmation { order_id: id }])
            .await?;

        info!(
            order_id = %details.order.id,
            order_number = %details.order.order_number,
            final_amount = %details.order.final_amount,
            "Order created"
        );
        Ok(details)
    }

    pub async fn get(&self, id: Uuid) -> ServiceResult<OrderDetails> {
        self.store
            .find_order(id)
            .await?
            .ok_or(ServiceError::NotFound("order"))
    }

    pub async fn list(&self, filter: &OrderFilter) -> ServiceResult<Vec<OrderDetails>> {
        Ok(self.store.list_orders(filter).await?)
    }

    pub async fn customers(&self) -> ServiceResult<Vec<CustomerSummary>> {
        Ok(self.store.list_customers().await?)
    }

    /// Applies a staff transition. Any status may follow any other; a present `status`
    /// queues one status-update notification.
    pub async fn transition(&self, id: Uuid, change: OrderTransition) -> ServiceResult<OrderDetails> {
        if change.payment_status == Some(PaymentStatus::Paid) {
            return Err(ServiceError::Validation(
                "orders are marked paid only by payment verification".into(),
            ));
        }

        let patch = change.into_patch();
        if patch.is_empty() {
            return self.get(id).await;
        }

        let events: Vec<OrderEvent> = patch
            .status
            .map(|status| OrderEvent::StatusUpdate {
                order_id: id,
                status,
            })
            .into_iter()
            .collect();

        let details = self.update(id, &patch, &events).await?;
        info!(
            order_id = %id,
            status = %details.order.status,
            payment_status = %details.order.payment_status,
            "Order updated"
        );
        Ok(details)
    }

    /// Stores the provider's session id for later correlation. No notification.
    pub(crate) async fn attach_payment_session(
        &self,
        id: Uuid,
        provider_order_id: &str,
    ) -> ServiceResult<OrderDetails> {
        let patch = OrderPatch {
            provider_order_id: Some(provider_order_id.to_string()),
            ..OrderPatch::default()
        };
        self.update(id, &patch, &[]).await
    }

    /// Marks the order paid and confirmed. Only the first successful call writes and
    /// queues the confirmation status update.
    pub(crate) async fn reconcile_payment(
        &self,
        id: Uuid,
        payment: &PaymentRecord,
    ) -> Result<PaymentOutcome, StoreError> {
        let patch = payment.as_patch();
        let events: Vec<OrderEvent> = patch
            .status
            .map(|status| OrderEvent::StatusUpdate {
                order_id: id,
                status,
            })
            .into_iter()
            .collect();
        self.store.record_payment(id, payment, &events).await
    }

    async fn update(
        &self,
        id: Uuid,
        patch: &OrderPatch,
        events: &[OrderEvent],
    ) -> ServiceResult<OrderDetails> {
        self.store
            .update_order(id, patch, events)
            .await?
            .ok_or(ServiceError::NotFound("order"))
    }
}

fn amount_too_large() -> ServiceError {
    ServiceError::Validation("order amount is too large".into())
}
