//! Persistence seam. The order lifecycle and the outbox dispatcher only talk to storage
//! through these traits, so the Postgres store and the in-memory store are interchangeable.

pub mod memory;
pub mod postgres;

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use thiserror::Error;
use uuid::Uuid;

use crate::domain::{
    CategoryGroup, CustomerSummary, DeliveryAddress, DeliveryArea, OrderDetails, OrderEvent,
    OrderPatch, OrderStatus, PaymentRecord, Product,
    catalog::{DeliveryAreaInput, ProductInput},
};

pub use memory::MemoryStore;
pub use postgres::PgStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("record not found")]
    NotFound,

    #[error(transparent)]
    Database(#[from] anyhow::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Everything needed to persist a new order in one transaction.
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub id: Uuid,
    pub order_number: String,
    /// Upserted by phone; also frozen on the order as its delivery snapshot.
    pub customer: DeliveryAddress,
    pub items: Vec<NewOrderItem>,
    pub total_amount: Decimal,
    pub delivery_charge: Decimal,
    pub final_amount: Decimal,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewOrderItem {
    pub product_id: String,
    pub quantity: Decimal,
    pub price: Decimal,
    pub total: Decimal,
}

#[derive(Debug, Clone, Default)]
pub struct OrderFilter {
    pub status: Option<OrderStatus>,
    /// Orders created on this UTC calendar day.
    pub date: Option<NaiveDate>,
}

impl OrderFilter {
    pub(crate) fn day_bounds(&self) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
        let start = self.date?.and_hms_opt(0, 0, 0)?.and_utc();
        Some((start, start + chrono::Duration::days(1)))
    }
}

#[derive(Debug, Clone, Default)]
pub struct ProductFilter {
    pub group: Option<CategoryGroup>,
    /// Include products with `available = false` (admin listing).
    pub include_unavailable: bool,
}

/// Result of recording a verified payment.
#[derive(Debug, Clone)]
pub enum PaymentOutcome {
    /// This call moved the order to paid.
    Recorded(OrderDetails),
    /// The order was already paid; nothing was written.
    AlreadyPaid(OrderDetails),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutboxStatus {
    Pending,
    Processing,
    Sent,
    Failed,
}

impl OutboxStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OutboxStatus::Pending => "PENDING",
            OutboxStatus::Processing => "PROCESSING",
            OutboxStatus::Sent => "SENT",
            OutboxStatus::Failed => "FAILED",
        }
    }
}

/// A claimed outbox row. `event` is `None` when the payload could not be decoded.
#[derive(Debug, Clone)]
pub struct OutboxEntry {
    pub id: i32,
    pub event_type: String,
    pub event: Option<OrderEvent>,
}

#[async_trait]
pub trait CatalogStore: Send + Sync {
    async fn list_products(&self, filter: &ProductFilter) -> StoreResult<Vec<Product>>;
    async fn find_products(&self, ids: &[String]) -> StoreResult<Vec<Product>>;
    async fn insert_product(&self, id: String, input: &ProductInput) -> StoreResult<Product>;
    async fn update_product(&self, id: &str, input: &ProductInput) -> StoreResult<Product>;
    async fn delete_product(&self, id: &str) -> StoreResult<()>;

    async fn list_delivery_areas(&self) -> StoreResult<Vec<DeliveryArea>>;
    async fn insert_delivery_area(&self, input: &DeliveryAreaInput) -> StoreResult<DeliveryArea>;
    async fn update_delivery_area(
        &self,
        id: Uuid,
        input: &DeliveryAreaInput,
    ) -> StoreResult<DeliveryArea>;
    async fn delete_delivery_area(&self, id: Uuid) -> StoreResult<()>;
}

#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Upserts the customer by phone, inserts the order with its items and writes
    /// `events` to the outbox, all-or-nothing.
    async fn create_order(&self, order: NewOrder, events: &[OrderEvent])
    -> StoreResult<OrderDetails>;

    async fn find_order(&self, id: Uuid) -> StoreResult<Option<OrderDetails>>;

    /// Newest first.
    async fn list_orders(&self, filter: &OrderFilter) -> StoreResult<Vec<OrderDetails>>;

    /// Applies the present fields of `patch` and writes `events`, atomically.
    /// Returns `None` when the order does not exist.
    async fn update_order(
        &self,
        id: Uuid,
        patch: &OrderPatch,
        events: &[OrderEvent],
    ) -> StoreResult<Option<OrderDetails>>;

    /// Marks the order paid unless it already is. `events` are written only when this
    /// call performs the transition.
    async fn record_payment(
        &self,
        id: Uuid,
        payment: &PaymentRecord,
        events: &[OrderEvent],
    ) -> StoreResult<PaymentOutcome>;

    async fn list_customers(&self) -> StoreResult<Vec<CustomerSummary>>;
}

#[async_trait]
pub trait OutboxStore: Send + Sync {
    /// Moves up to `limit` pending entries to `PROCESSING` and returns them, oldest first.
    async fn claim_outbox(&self, limit: i64) -> StoreResult<Vec<OutboxEntry>>;

    async fn complete_outbox(&self, id: i32, status: OutboxStatus) -> StoreResult<()>;

    /// Returns `PROCESSING` entries claimed more than `lease` ago to `PENDING`, so entries
    /// held by a dispatcher that died mid-batch are picked up again. Returns how many.
    async fn release_stale_outbox(&self, lease: Duration) -> StoreResult<usize>;
}

pub trait Store: CatalogStore + OrderStore + OutboxStore {}

impl<T> Store for T where T: CatalogStore + OrderStore + OutboxStore {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn day_bounds_cover_one_utc_day() {
        let filter = OrderFilter {
            status: None,
            date: NaiveDate::from_ymd_opt(2025, 3, 9),
        };
        let (start, end) = filter.day_bounds().unwrap();
        assert_eq!(start.to_rfc3339(), "2025-03-09T00:00:00+00:00");
        assert_eq!(end - start, chrono::Duration::days(1));
        assert!(OrderFilter::default().day_bounds().is_none());
    }
}
