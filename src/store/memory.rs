//! Single-mutex in-memory store. Every operation runs under one lock, which gives the
//! same all-or-nothing visibility as the Postgres transactions. Used for `STORAGE=memory`
//! and by the test-suite.

use std::{
    collections::{BTreeMap, HashMap},
    sync::{
        Mutex, MutexGuard,
        atomic::{AtomicBool, AtomicU64, Ordering},
    },
    time::Duration,
};

use anyhow::anyhow;
use async_trait::async_trait;
use chrono::{DateTime, TimeDelta, Utc};
use uuid::Uuid;

use crate::{
    domain::{
        Customer, CustomerSummary, DeliveryArea, Order, OrderDetails, OrderEvent, OrderItem,
        OrderPatch, OrderStatus, PaymentRecord, PaymentStatus, Product,
        catalog::{DeliveryAreaInput, ProductInput},
    },
    store::{
        CatalogStore, NewOrder, OrderFilter, OrderStore, OutboxEntry, OutboxStatus, OutboxStore,
        PaymentOutcome, ProductFilter, StoreError, StoreResult,
    },
};

#[derive(Debug, Clone)]
struct StoredItem {
    id: Uuid,
    product_id: String,
    quantity: rust_decimal::Decimal,
    price: rust_decimal::Decimal,
    total: rust_decimal::Decimal,
}

#[derive(Debug, Clone)]
struct StoredOutbox {
    id: i32,
    event: OrderEvent,
    status: OutboxStatus,
    updated_at: DateTime<Utc>,
}

#[derive(Default)]
struct Inner {
    customers: HashMap<Uuid, Customer>,
    products: BTreeMap<String, Product>,
    areas: HashMap<Uuid, DeliveryArea>,
    orders: HashMap<Uuid, (Order, Vec<StoredItem>)>,
    outbox: Vec<StoredOutbox>,
    next_outbox_id: i32,
}

impl Inner {
    fn details(&self, id: Uuid) -> StoreResult<Option<OrderDetails>> {
        let Some((order, items)) = self.orders.get(&id) else {
            return Ok(None);
        };
        let customer = self
            .customers
            .get(&order.customer_id)
            .cloned()
            .ok_or_else(|| anyhow!("Customer {} missing for order {}", order.customer_id, id))?;
        let items = items
            .iter()
            .map(|item| OrderItem {
                id: item.id,
                product_id: item.product_id.clone(),
                quantity: item.quantity,
                price: item.price,
                total: item.total,
                product: self.products.get(&item.product_id).cloned(),
            })
            .collect();
        Ok(Some(OrderDetails {
            order: order.clone(),
            customer,
            items,
        }))
    }

    fn push_events(&mut self, events: &[OrderEvent]) {
        for event in events {
            self.next_outbox_id += 1;
            self.outbox.push(StoredOutbox {
                id: self.next_outbox_id,
                event: event.clone(),
                status: OutboxStatus::Pending,
                updated_at: Utc::now(),
            });
        }
    }
}

fn apply_patch(order: &mut Order, patch: &OrderPatch) {
    if let Some(status) = patch.status {
        order.status = status;
    }
    if let Some(payment_status) = patch.payment_status {
        order.payment_status = payment_status;
    }
    if let Some(method) = &patch.payment_method {
        order.payment_method = Some(method.clone());
    }
    if let Some(id) = &patch.provider_order_id {
        order.provider_order_id = Some(id.clone());
    }
    if let Some(id) = &patch.provider_payment_id {
        order.provider_payment_id = Some(id.clone());
    }
    if let Some(date) = patch.delivery_date {
        order.delivery_date = Some(date);
    }
    if let Some(slot) = &patch.delivery_slot {
        order.delivery_slot = Some(slot.clone());
    }
    order.updated_at = Utc::now();
}

#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
    fail_writes: AtomicBool,
    payment_delay_ms: AtomicU64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Simulates an unavailable database: every subsequent write fails before touching
    /// any state until switched back off.
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Makes `record_payment` wait this long before touching state, like a slow database.
    pub fn set_payment_delay(&self, delay: Duration) {
        let millis = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX);
        self.payment_delay_ms.store(millis, Ordering::SeqCst);
    }

    /// Statuses of all outbox entries, oldest first.
    pub fn outbox_statuses(&self) -> Vec<(String, OutboxStatus)> {
        self.inner
            .lock()
            .map(|inner| {
                inner
                    .outbox
                    .iter()
                    .map(|entry| (entry.event.event_type().to_string(), entry.status))
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn customer_count(&self) -> usize {
        self.inner.lock().map(|inner| inner.customers.len()).unwrap_or(0)
    }

    fn lock(&self) -> StoreResult<MutexGuard<'_, Inner>> {
        self.inner
            .lock()
            .map_err(|_| StoreError::Database(anyhow!("memory store lock poisoned")))
    }

    fn lock_for_write(&self) -> StoreResult<MutexGuard<'_, Inner>> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StoreError::Database(anyhow!("simulated write failure")));
        }
        self.lock()
    }
}

#[async_trait]
impl CatalogStore for MemoryStore {
    async fn list_products(&self, filter: &ProductFilter) -> StoreResult<Vec<Product>> {
        let inner = self.lock()?;
        let mut products: Vec<Product> = inner
            .products
            .values()
            .filter(|p| filter.include_unavailable || p.available)
            .filter(|p| filter.group.is_none_or(|group| p.category.group() == group))
            .cloned()
            .collect();
        products.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(products)
    }

    async fn find_products(&self, ids: &[String]) -> StoreResult<Vec<Product>> {
        let inner = self.lock()?;
        Ok(ids
            .iter()
            .filter_map(|id| inner.products.get(id).cloned())
            .collect())
    }

    async fn insert_product(&self, id: String, input: &ProductInput) -> StoreResult<Product> {
        let mut inner = self.lock_for_write()?;
        if inner.products.contains_key(&id) {
            return Err(StoreError::Database(anyhow!("product {id} already exists")));
        }
        let now = Utc::now();
        let product = Product {
            id: id.clone(),
            name: input.name.trim().to_string(),
            name_localized: input.name_localized.clone(),
            category: input.category,
            price: input.price,
            unit: input.unit,
            description: input.description.clone(),
            image: input.image.clone(),
            stock: input.stock,
            min_order_quantity: input.min_order_quantity,
            available: input.available,
            created_at: now,
            updated_at: now,
        };
        inner.products.insert(id, product.clone());
        Ok(product)
    }

    async fn update_product(&self, id: &str, input: &ProductInput) -> StoreResult<Product> {
        let mut inner = self.lock_for_write()?;
        let product = inner.products.get_mut(id).ok_or(StoreError::NotFound)?;
        product.name = input.name.trim().to_string();
        product.name_localized = input.name_localized.clone();
        product.category = input.category;
        product.price = input.price;
        product.unit = input.unit;
        product.description = input.description.clone();
        product.image = input.image.clone();
        product.stock = input.stock;
        product.min_order_quantity = input.min_order_quantity;
        product.available = input.available;
        product.updated_at = Utc::now();
        Ok(product.clone())
    }

    async fn delete_product(&self, id: &str) -> StoreResult<()> {
        let mut inner = self.lock_for_write()?;
        inner
            .products
            .remove(id)
            .map(|_| ())
            .ok_or(StoreError::NotFound)
    }

    async fn list_delivery_areas(&self) -> StoreResult<Vec<DeliveryArea>> {
        let inner = self.lock()?;
        let mut areas: Vec<DeliveryArea> = inner.areas.values().cloned().collect();
        areas.sort_by(|a, b| a.area.cmp(&b.area));
        Ok(areas)
    }

    async fn insert_delivery_area(&self, input: &DeliveryAreaInput) -> StoreResult<DeliveryArea> {
        let mut inner = self.lock_for_write()?;
        let now = Utc::now();
        let area = DeliveryArea {
            id: Uuid::new_v4(),
            area: input.area.trim().to_string(),
            charge: input.charge,
            created_at: now,
            updated_at: now,
        };
        inner.areas.insert(area.id, area.clone());
        Ok(area)
    }

    async fn update_delivery_area(
        &self,
        id: Uuid,
        input: &DeliveryAreaInput,
    ) -> StoreResult<DeliveryArea> {
        let mut inner = self.lock_for_write()?;
        let area = inner.areas.get_mut(&id).ok_or(StoreError::NotFound)?;
        area.area = input.area.trim().to_string();
        area.charge = input.charge;
        area.updated_at = Utc::now();
        Ok(area.clone())
    }

    async fn delete_delivery_area(&self, id: Uuid) -> StoreResult<()> {
        let mut inner = self.lock_for_write()?;
        inner
            .areas
            .remove(&id)
            .map(|_| ())
            .ok_or(StoreError::NotFound)
    }
}

#[async_trait]
impl OrderStore for MemoryStore {
    async fn create_order(
        &self,
        order: NewOrder,
        events: &[OrderEvent],
    ) -> StoreResult<OrderDetails> {
        let mut inner = self.lock_for_write()?;
        let now = Utc::now();

        let existing = inner
            .customers
            .values()
            .find(|c| c.phone == order.customer.phone)
            .map(|c| (c.id, c.created_at));
        let (customer_id, created_at) = existing.unwrap_or((Uuid::new_v4(), now));
        let snapshot = order.customer.clone();
        inner.customers.insert(
            customer_id,
            Customer {
                id: customer_id,
                name: snapshot.name.clone(),
                phone: snapshot.phone.clone(),
                email: snapshot.email.clone(),
                address: snapshot.address.clone(),
                area: snapshot.area.clone(),
                pincode: snapshot.pincode.clone(),
                created_at,
                updated_at: now,
            },
        );

        let items = order
            .items
            .into_iter()
            .map(|item| StoredItem {
                id: Uuid::new_v4(),
                product_id: item.product_id,
                quantity: item.quantity,
                price: item.price,
                total: item.total,
            })
            .collect();

        let record = Order {
            id: order.id,
            order_number: order.order_number,
            customer_id,
            delivery_address: snapshot,
            total_amount: order.total_amount,
            delivery_charge: order.delivery_charge,
            final_amount: order.final_amount,
            status: OrderStatus::Pending,
            payment_status: PaymentStatus::Pending,
            payment_method: None,
            provider_order_id: None,
            provider_payment_id: None,
            delivery_date: None,
            delivery_slot: None,
            notes: order.notes,
            created_at: now,
            updated_at: now,
        };
        inner.orders.insert(record.id, (record, items));
        inner.push_events(events);

        inner
            .details(order.id)?
            .ok_or_else(|| StoreError::Database(anyhow!("order {} vanished", order.id)))
    }

    async fn find_order(&self, id: Uuid) -> StoreResult<Option<OrderDetails>> {
        self.lock()?.details(id)
    }

    async fn list_orders(&self, filter: &OrderFilter) -> StoreResult<Vec<OrderDetails>> {
        let inner = self.lock()?;
        let bounds = filter.day_bounds();
        let mut orders: Vec<&Order> = inner
            .orders
            .values()
            .map(|(order, _)| order)
            .filter(|order| filter.status.is_none_or(|status| order.status == status))
            .filter(|order| {
                bounds.is_none_or(|(start, end)| order.created_at >= start && order.created_at < end)
            })
            .collect();
        orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        orders
            .into_iter()
            .filter_map(|order| inner.details(order.id).transpose())
            .collect()
    }

    async fn update_order(
        &self,
        id: Uuid,
        patch: &OrderPatch,
        events: &[OrderEvent],
    ) -> StoreResult<Option<OrderDetails>> {
        let mut inner = self.lock_for_write()?;
        let Some((order, _)) = inner.orders.get_mut(&id) else {
            return Ok(None);
        };
        apply_patch(order, patch);
        inner.push_events(events);
        inner.details(id)
    }

    async fn record_payment(
        &self,
        id: Uuid,
        payment: &PaymentRecord,
        events: &[OrderEvent],
    ) -> StoreResult<PaymentOutcome> {
        let delay = self.payment_delay_ms.load(Ordering::SeqCst);
        if delay > 0 {
            tokio::time::sleep(Duration::from_millis(delay)).await;
        }
        let mut inner = self.lock_for_write()?;
        let (order, _) = inner.orders.get_mut(&id).ok_or(StoreError::NotFound)?;

        if order.is_paid() {
            let details = inner.details(id)?.ok_or(StoreError::NotFound)?;
            return Ok(PaymentOutcome::AlreadyPaid(details));
        }

        apply_patch(order, &payment.as_patch());
        inner.push_events(events);
        let details = inner.details(id)?.ok_or(StoreError::NotFound)?;
        Ok(PaymentOutcome::Recorded(details))
    }

    async fn list_customers(&self) -> StoreResult<Vec<CustomerSummary>> {
        let inner = self.lock()?;
        let mut counts: HashMap<Uuid, i64> = HashMap::new();
        for (order, _) in inner.orders.values() {
            *counts.entry(order.customer_id).or_default() += 1;
        }
        let mut customers: Vec<CustomerSummary> = inner
            .customers
            .values()
            .map(|customer| CustomerSummary {
                order_count: counts.get(&customer.id).copied().unwrap_or(0),
                customer: customer.clone(),
            })
            .collect();
        customers.sort_by(|a, b| b.customer.created_at.cmp(&a.customer.created_at));
        Ok(customers)
    }
}

#[async_trait]
impl OutboxStore for MemoryStore {
    async fn claim_outbox(&self, limit: i64) -> StoreResult<Vec<OutboxEntry>> {
        let mut inner = self.lock()?;
        let limit = usize::try_from(limit).unwrap_or(0);
        Ok(inner
            .outbox
            .iter_mut()
            .filter(|entry| entry.status == OutboxStatus::Pending)
            .take(limit)
            .map(|entry| {
                entry.status = OutboxStatus::Processing;
                entry.updated_at = Utc::now();
                OutboxEntry {
                    id: entry.id,
                    event_type: entry.event.event_type().to_string(),
                    event: Some(entry.event.clone()),
                }
            })
            .collect())
    }

    async fn complete_outbox(&self, id: i32, status: OutboxStatus) -> StoreResult<()> {
        let mut inner = self.lock()?;
        let entry = inner
            .outbox
            .iter_mut()
            .find(|entry| entry.id == id)
            .ok_or(StoreError::NotFound)?;
        entry.status = status;
        entry.updated_at = Utc::now();
        Ok(())
    }

    async fn release_stale_outbox(&self, lease: Duration) -> StoreResult<usize> {
        let mut inner = self.lock()?;
        let cutoff = Utc::now()
            - TimeDelta::from_std(lease)
                .map_err(|e| StoreError::Database(anyhow!("outbox lease is too long: {e}")))?;
        let mut released = 0;
        for entry in inner
            .outbox
            .iter_mut()
            .filter(|entry| entry.status == OutboxStatus::Processing && entry.updated_at < cutoff)
        {
            entry.status = OutboxStatus::Pending;
            entry.updated_at = Utc::now();
            released += 1;
        }
        Ok(released)
    }
}
