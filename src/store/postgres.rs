use std::{collections::HashMap, time::Duration};

use anyhow::{Context, anyhow};
use async_trait::async_trait;
use chrono::{TimeDelta, Utc};
use diesel::{
    BoolExpressionMethods, ExpressionMethods, OptionalExtension, QueryDsl, SelectableHelper,
    dsl::count_star, upsert::excluded,
};
use diesel_async::{
    AsyncConnection, AsyncPgConnection, RunQueryDsl,
    pooled_connection::{AsyncDieselConnectionManager, bb8::Pool},
};
use uuid::Uuid;

use crate::{
    domain::{
        Customer, CustomerSummary, DeliveryArea, Order, OrderDetails, OrderEvent, OrderPatch,
        PaymentRecord, PaymentStatus, Product,
        catalog::{DeliveryAreaInput, ProductInput},
    },
    models::{
        CreateOrderEntity, CreateOrderItemEntity, CreateOutboxEntity, CustomerEntity,
        DeliveryAreaEntity, OrderChangeset, OrderEntity, OrderItemEntity, OutboxEntity,
        ProductEntity, UpsertCustomerEntity, WriteDeliveryAreaEntity, WriteProductEntity,
    },
    schema::{customers, delivery_areas, order_items, orders, outbox, products},
    store::{
        CatalogStore, NewOrder, OrderFilter, OrderStore, OutboxEntry, OutboxStatus, OutboxStore,
        PaymentOutcome, ProductFilter, StoreError, StoreResult,
    },
};

pub type DbPool = Pool<AsyncPgConnection>;

/// Production store backed by PostgreSQL through a bb8 pool of async diesel connections.
#[derive(Clone)]
pub struct PgStore {
    pool: DbPool,
}

impl PgStore {
    pub async fn connect(url: &str, max_connections: u32) -> anyhow::Result<Self> {
        let manager = AsyncDieselConnectionManager::<AsyncPgConnection>::new(url);
        let pool = Pool::builder()
            .max_size(max_connections)
            .build(manager)
            .await
            .context("Failed to build DB connection pool")?;
        Ok(Self { pool })
    }

    pub fn from_pool(pool: DbPool) -> Self {
        Self { pool }
    }

    async fn conn(
        &self,
    ) -> anyhow::Result<
        diesel_async::pooled_connection::bb8::PooledConnection<'_, AsyncPgConnection>,
    > {
        self.pool
            .get()
            .await
            .context("Failed to obtain a DB connection pool")
    }
}

fn outbox_rows(events: &[OrderEvent]) -> anyhow::Result<Vec<CreateOutboxEntity>> {
    events
        .iter()
        .map(|event| {
            Ok(CreateOutboxEntity {
                event_type: event.event_type().to_string(),
                payload: serde_json::to_string(event).context("Failed to encode outbox event")?,
                status: OutboxStatus::Pending.as_str().to_string(),
            })
        })
        .collect()
}

/// Loads customers, items and products for `rows` and assembles the joined view,
/// preserving the order of `rows`.
async fn load_details(
    conn: &mut AsyncPgConnection,
    rows: Vec<(OrderEntity, CustomerEntity)>,
) -> anyhow::Result<Vec<OrderDetails>> {
    let order_ids: Vec<Uuid> = rows.iter().map(|(order, _)| order.id).collect();

    let items: Vec<(OrderItemEntity, Option<ProductEntity>)> = order_items::table
        .left_join(products::table)
        .filter(order_items::order_id.eq_any(&order_ids))
        .order_by((order_items::order_id, order_items::position))
        .select((
            OrderItemEntity::as_select(),
            Option::<ProductEntity>::as_select(),
        ))
        .load(conn)
        .await
        .context("Failed to get order items")?;

    let mut group: HashMap<Uuid, Vec<_>> = HashMap::new();
    for (item, product) in items {
        let product = product.map(Product::try_from).transpose()?;
        group
            .entry(item.order_id)
            .or_default()
            .push(item.into_domain(product));
    }

    rows.into_iter()
        .map(|(order, customer)| {
            let items = group.remove(&order.id).unwrap_or_default();
            Ok(OrderDetails {
                order: Order::try_from(order)?,
                customer: Customer::from(customer),
                items,
            })
        })
        .collect()
}

async fn load_one(conn: &mut AsyncPgConnection, id: Uuid) -> anyhow::Result<Option<OrderDetails>> {
    let row: Option<(OrderEntity, CustomerEntity)> = orders::table
        .inner_join(customers::table)
        .filter(orders::id.eq(id))
        .select((OrderEntity::as_select(), CustomerEntity::as_select()))
        .first(conn)
        .await
        .optional()
        .context("Failed to get order")?;

    match row {
        Some(row) => Ok(load_details(conn, vec![row]).await?.pop()),
        None => Ok(None),
    }
}

#[async_trait]
impl CatalogStore for PgStore {
    async fn list_products(&self, filter: &ProductFilter) -> StoreResult<Vec<Product>> {
        let conn = &mut self.conn().await?;

        let mut query = products::table
            .select(ProductEntity::as_select())
            .into_boxed();
        if !filter.include_unavailable {
            query = query.filter(products::available.eq(true));
        }
        if let Some(group) = filter.group {
            let categories: Vec<&str> = group.categories().iter().map(|c| c.as_str()).collect();
            query = query.filter(products::category.eq_any(categories));
        }

        let rows: Vec<ProductEntity> = query
            .order_by(products::name.asc())
            .load(conn)
            .await
            .context("Failed to get products")?;

        Ok(rows
            .into_iter()
            .map(Product::try_from)
            .collect::<anyhow::Result<_>>()?)
    }

    async fn find_products(&self, ids: &[String]) -> StoreResult<Vec<Product>> {
        let conn = &mut self.conn().await?;

        let rows: Vec<ProductEntity> = products::table
            .filter(products::id.eq_any(ids))
            .select(ProductEntity::as_select())
            .load(conn)
            .await
            .context("Failed to get products")?;

        Ok(rows
            .into_iter()
            .map(Product::try_from)
            .collect::<anyhow::Result<_>>()?)
    }

    async fn insert_product(&self, id: String, input: &ProductInput) -> StoreResult<Product> {
        let conn = &mut self.conn().await?;

        let row: ProductEntity = diesel::insert_into(products::table)
            .values((products::id.eq(&id), WriteProductEntity::from(input)))
            .returning(ProductEntity::as_returning())
            .get_result(conn)
            .await
            .context("Failed to create product")?;

        Ok(Product::try_from(row)?)
    }

    async fn update_product(&self, id: &str, input: &ProductInput) -> StoreResult<Product> {
        let conn = &mut self.conn().await?;

        let row: Option<ProductEntity> = diesel::update(products::table.find(id))
            .set((
                WriteProductEntity::from(input),
                products::updated_at.eq(Utc::now()),
            ))
            .returning(ProductEntity::as_returning())
            .get_result(conn)
            .await
            .optional()
            .context("Failed to update product")?;

        let row = row.ok_or(StoreError::NotFound)?;
        Ok(Product::try_from(row)?)
    }

    async fn delete_product(&self, id: &str) -> StoreResult<()> {
        let conn = &mut self.conn().await?;

        let deleted = diesel::delete(products::table.find(id))
            .execute(conn)
            .await
            .context("Failed to delete product")?;

        if deleted == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    async fn list_delivery_areas(&self) -> StoreResult<Vec<DeliveryArea>> {
        let conn = &mut self.conn().await?;

        let rows: Vec<DeliveryAreaEntity> = delivery_areas::table
            .order_by(delivery_areas::area.asc())
            .select(DeliveryAreaEntity::as_select())
            .load(conn)
            .await
            .context("Failed to get delivery areas")?;

        Ok(rows.into_iter().map(DeliveryArea::from).collect())
    }

    async fn insert_delivery_area(&self, input: &DeliveryAreaInput) -> StoreResult<DeliveryArea> {
        let conn = &mut self.conn().await?;

        let row: DeliveryAreaEntity = diesel::insert_into(delivery_areas::table)
            .values((
                delivery_areas::id.eq(Uuid::new_v4()),
                WriteDeliveryAreaEntity::from(input),
            ))
            .returning(DeliveryAreaEntity::as_returning())
            .get_result(conn)
            .await
            .context("Failed to create delivery area")?;

        Ok(row.into())
    }

    async fn update_delivery_area(
        &self,
        id: Uuid,
        input: &DeliveryAreaInput,
    ) -> StoreResult<DeliveryArea> {
        let conn = &mut self.conn().await?;

        let row: Option<DeliveryAreaEntity> = diesel::update(delivery_areas::table.find(id))
            .set((
                WriteDeliveryAreaEntity::from(input),
                delivery_areas::updated_at.eq(Utc::now()),
            ))
            .returning(DeliveryAreaEntity::as_returning())
            .get_result(conn)
            .await
            .optional()
            .context("Failed to update delivery area")?;

        Ok(row.ok_or(StoreError::NotFound)?.into())
    }

    async fn delete_delivery_area(&self, id: Uuid) -> StoreResult<()> {
        let conn = &mut self.conn().await?;

        let deleted = diesel::delete(delivery_areas::table.find(id))
            .execute(conn)
            .await
            .context("Failed to delete delivery area")?;

        if deleted == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }
}

#[async_trait]
impl OrderStore for PgStore {
    async fn create_order(
        &self,
        order: NewOrder,
        events: &[OrderEvent],
    ) -> StoreResult<OrderDetails> {
        let conn = &mut self.conn().await?;
        let outbox_rows = outbox_rows(events)?;
        let order_id = order.id;

        conn.transaction(move |conn| {
            Box::pin(async move {
                let customer = UpsertCustomerEntity::from(&order.customer);
                let customer: CustomerEntity = diesel::insert_into(customers::table)
                    .values(&customer)
                    .on_conflict(customers::phone)
                    .do_update()
                    .set((
                        customers::name.eq(excluded(customers::name)),
                        customers::email.eq(excluded(customers::email)),
                        customers::address.eq(excluded(customers::address)),
                        customers::area.eq(excluded(customers::area)),
                        customers::pincode.eq(excluded(customers::pincode)),
                        customers::updated_at.eq(Utc::now()),
                    ))
                    .returning(CustomerEntity::as_returning())
                    .get_result(conn)
                    .await
                    .context("Failed to upsert customer")?;

                diesel::insert_into(orders::table)
                    .values(CreateOrderEntity {
                        id: order.id,
                        order_number: order.order_number,
                        customer_id: customer.id,
                        delivery_address: serde_json::to_value(&order.customer)
                            .context("Failed to encode delivery address")?,
                        total_amount: order.total_amount,
                        delivery_charge: order.delivery_charge,
                        final_amount: order.final_amount,
                        status: "pending".into(),
                        payment_status: "pending".into(),
                        notes: order.notes,
                    })
                    .execute(conn)
                    .await
                    .context("Failed to create order")?;

                let items: Vec<CreateOrderItemEntity> = order
                    .items
                    .into_iter()
                    .enumerate()
                    .map(|(position, item)| CreateOrderItemEntity {
                        id: Uuid::new_v4(),
                        order_id: order.id,
                        product_id: item.product_id,
                        position: position as i32,
                        quantity: item.quantity,
                        price: item.price,
                        total: item.total,
                    })
                    .collect();

                diesel::insert_into(order_items::table)
                    .values(items)
                    .execute(conn)
                    .await
                    .context("Failed to create order items")?;

                diesel::insert_into(outbox::table)
                    .values(outbox_rows)
                    .execute(conn)
                    .await
                    .context("Failed to write outbox")?;

                Ok::<(), anyhow::Error>(())
            })
        })
        .await
        .context("Transaction failed")?;

        load_one(conn, order_id)
            .await?
            .ok_or_else(|| StoreError::Database(anyhow!("Order {order_id} vanished after commit")))
    }

    async fn find_order(&self, id: Uuid) -> StoreResult<Option<OrderDetails>> {
        let conn = &mut self.conn().await?;
        Ok(load_one(conn, id).await?)
    }

    async fn list_orders(&self, filter: &OrderFilter) -> StoreResult<Vec<OrderDetails>> {
        let conn = &mut self.conn().await?;

        let mut query = orders::table
            .inner_join(customers::table)
            .select((OrderEntity::as_select(), CustomerEntity::as_select()))
            .into_boxed();
        if let Some(status) = filter.status {
            query = query.filter(orders::status.eq(status.as_str()));
        }
        if let Some((start, end)) = filter.day_bounds() {
            query = query.filter(
                orders::created_at
                    .ge(start)
                    .and(orders::created_at.lt(end)),
            );
        }

        let rows: Vec<(OrderEntity, CustomerEntity)> = query
            .order_by(orders::created_at.desc())
            .load(conn)
            .await
            .context("Failed to get orders")?;

        Ok(load_details(conn, rows).await?)
    }

    async fn update_order(
        &self,
        id: Uuid,
        patch: &OrderPatch,
        events: &[OrderEvent],
    ) -> StoreResult<Option<OrderDetails>> {
        let conn = &mut self.conn().await?;
        let changeset = OrderChangeset::from(patch);
        let outbox_rows = outbox_rows(events)?;

        let updated = conn
            .transaction(move |conn| {
                Box::pin(async move {
                    let updated = diesel::update(orders::table.find(id))
                        .set(&changeset)
                        .execute(conn)
                        .await
                        .context("Failed to update order")?;

                    if updated == 0 {
                        return Ok::<bool, anyhow::Error>(false);
                    }

                    if !outbox_rows.is_empty() {
                        diesel::insert_into(outbox::table)
                            .values(outbox_rows)
                            .execute(conn)
                            .await
                            .context("Failed to write outbox")?;
                    }

                    Ok(true)
                })
            })
            .await
            .context("Transaction failed")?;

        if !updated {
            return Ok(None);
        }
        Ok(load_one(conn, id).await?)
    }

    async fn record_payment(
        &self,
        id: Uuid,
        payment: &PaymentRecord,
        events: &[OrderEvent],
    ) -> StoreResult<PaymentOutcome> {
        let conn = &mut self.conn().await?;
        let changeset = OrderChangeset::from(&payment.as_patch());
        let outbox_rows = outbox_rows(events)?;

        // The payment_status guard makes concurrent verifications race safely: exactly
        // one UPDATE matches, the other sees zero rows and reports AlreadyPaid.
        let recorded = conn
            .transaction(move |conn| {
                Box::pin(async move {
                    let updated = diesel::update(
                        orders::table
                            .find(id)
                            .filter(orders::payment_status.ne(PaymentStatus::Paid.as_str())),
                    )
                    .set(&changeset)
                    .execute(conn)
                    .await
                    .context("Failed to record payment")?;

                    if updated == 0 {
                        return Ok::<bool, anyhow::Error>(false);
                    }

                    diesel::insert_into(outbox::table)
                        .values(outbox_rows)
                        .execute(conn)
                        .await
                        .context("Failed to write outbox")?;

                    Ok(true)
                })
            })
            .await
            .context("Transaction failed")?;

        let details = load_one(conn, id).await?.ok_or(StoreError::NotFound)?;
        if recorded {
            Ok(PaymentOutcome::Recorded(details))
        } else if details.order.is_paid() {
            Ok(PaymentOutcome::AlreadyPaid(details))
        } else {
            Err(StoreError::Database(anyhow!(
                "Order {id} could not be marked paid"
            )))
        }
    }

    async fn list_customers(&self) -> StoreResult<Vec<CustomerSummary>> {
        let conn = &mut self.conn().await?;

        let rows: Vec<CustomerEntity> = customers::table
            .order_by(customers::created_at.desc())
            .select(CustomerEntity::as_select())
            .load(conn)
            .await
            .context("Failed to get customers")?;

        let counts: Vec<(Uuid, i64)> = orders::table
            .group_by(orders::customer_id)
            .select((orders::customer_id, count_star()))
            .load(conn)
            .await
            .context("Failed to count orders per customer")?;
        let counts: HashMap<Uuid, i64> = counts.into_iter().collect();

        Ok(rows
            .into_iter()
            .map(|customer| CustomerSummary {
                order_count: counts.get(&customer.id).copied().unwrap_or(0),
                customer: customer.into(),
            })
            .collect())
    }
}

#[async_trait]
impl OutboxStore for PgStore {
    async fn claim_outbox(&self, limit: i64) -> StoreResult<Vec<OutboxEntry>> {
        let conn = &mut self.conn().await?;

        let rows = conn
            .transaction(move |conn| {
                Box::pin(async move {
                    let ids: Vec<i32> = outbox::table
                        .select(outbox::id)
                        .filter(outbox::status.eq(OutboxStatus::Pending.as_str()))
                        .order_by(outbox::id.asc())
                        .limit(limit)
                        .for_update()
                        .skip_locked()
                        .load(conn)
                        .await
                        .context("Failed to select outbox entries")?;

                    let mut rows: Vec<OutboxEntity> =
                        diesel::update(outbox::table.filter(outbox::id.eq_any(&ids)))
                            .set((
                                outbox::status.eq(OutboxStatus::Processing.as_str()),
                                outbox::updated_at.eq(Utc::now()),
                            ))
                            .returning(OutboxEntity::as_returning())
                            .get_results(conn)
                            .await
                            .context("Failed to claim outbox entries")?;
                    rows.sort_by_key(|row| row.id);

                    Ok::<Vec<OutboxEntity>, anyhow::Error>(rows)
                })
            })
            .await
            .context("Transaction failed")?;

        Ok(rows
            .into_iter()
            .map(|row| OutboxEntry {
                id: row.id,
                event: serde_json::from_str(&row.payload).ok(),
                event_type: row.event_type,
            })
            .collect())
    }

    async fn complete_outbox(&self, id: i32, status: OutboxStatus) -> StoreResult<()> {
        let conn = &mut self.conn().await?;

        diesel::update(outbox::table.find(id))
            .set((
                outbox::status.eq(status.as_str()),
                outbox::updated_at.eq(Utc::now()),
            ))
            .execute(conn)
            .await
            .context("Failed to update outbox entry")?;

        Ok(())
    }

    async fn release_stale_outbox(&self, lease: Duration) -> StoreResult<usize> {
        let conn = &mut self.conn().await?;
        let cutoff = Utc::now() - TimeDelta::from_std(lease).context("Outbox lease is too long")?;

        let released = diesel::update(
            outbox::table
                .filter(outbox::status.eq(OutboxStatus::Processing.as_str()))
                .filter(outbox::updated_at.lt(cutoff)),
        )
        .set((
            outbox::status.eq(OutboxStatus::Pending.as_str()),
            outbox::updated_at.eq(Utc::now()),
        ))
        .execute(conn)
        .await
        .context("Failed to release stale outbox entries")?;

        Ok(released)
    }
}
