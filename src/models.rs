use anyhow::{Context, Result, anyhow};
use chrono::{DateTime, NaiveDate, Utc};
use diesel::{
    Selectable,
    prelude::{AsChangeset, Associations, Identifiable, Insertable, Queryable},
};
use rust_decimal::Decimal;
use serde_json::Value;
use uuid::Uuid;

use crate::domain::{
    Customer, DeliveryAddress, DeliveryArea, Order, OrderItem, OrderPatch, Product,
    catalog::{DeliveryAreaInput, ProductInput},
};

// Customers

#[derive(Queryable, Selectable, Identifiable, Debug, Clone)]
#[diesel(table_name = crate::schema::customers)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct CustomerEntity {
    pub id: Uuid,
    pub name: String,
    pub phone: String,
    pub email: Option<String>,
    pub address: String,
    pub area: String,
    pub pincode: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Insertable, Debug)]
#[diesel(table_name = crate::schema::customers)]
pub struct UpsertCustomerEntity<'a> {
    pub id: Uuid,
    pub name: &'a str,
    pub phone: &'a str,
    pub email: Option<&'a str>,
    pub address: &'a str,
    pub area: &'a str,
    pub pincode: &'a str,
}

impl<'a> From<&'a DeliveryAddress> for UpsertCustomerEntity<'a> {
    fn from(value: &'a DeliveryAddress) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: &value.name,
            phone: &value.phone,
            email: value.email.as_deref(),
            address: &value.address,
            area: &value.area,
            pincode: &value.pincode,
        }
    }
}

impl From<CustomerEntity> for Customer {
    fn from(value: CustomerEntity) -> Self {
        Self {
            id: value.id,
            name: value.name,
            phone: value.phone,
            email: value.email,
            address: value.address,
            area: value.area,
            pincode: value.pincode,
            created_at: value.created_at,
            updated_at: value.updated_at,
        }
    }
}

// Products

#[derive(Queryable, Selectable, Identifiable, Debug, Clone)]
#[diesel(table_name = crate::schema::products)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct ProductEntity {
    pub id: String,
    pub name: String,
    pub name_localized: Option<String>,
    pub category: String,
    pub price: Decimal,
    pub unit: String,
    pub description: String,
    pub image: String,
    pub stock: i32,
    pub min_order_quantity: Decimal,
    pub available: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Insertable, AsChangeset, Debug)]
#[diesel(table_name = crate::schema::products)]
#[diesel(treat_none_as_null = true)]
pub struct WriteProductEntity<'a> {
    pub name: &'a str,
    pub name_localized: Option<&'a str>,
    pub category: &'a str,
    pub price: Decimal,
    pub unit: &'a str,
    pub description: &'a str,
    pub image: &'a str,
    pub stock: i32,
    pub min_order_quantity: Decimal,
    pub available: bool,
}

impl<'a> From<&'a ProductInput> for WriteProductEntity<'a> {
    fn from(value: &'a ProductInput) -> Self {
        Self {
            name: value.name.trim(),
            name_localized: value.name_localized.as_deref(),
            category: value.category.as_str(),
            price: value.price,
            unit: value.unit.as_str(),
            description: &value.description,
            image: &value.image,
            stock: value.stock,
            min_order_quantity: value.min_order_quantity,
            available: value.available,
        }
    }
}

impl TryFrom<ProductEntity> for Product {
    type Error = anyhow::Error;

    fn try_from(value: ProductEntity) -> Result<Self> {
        Ok(Self {
            category: value.category.parse().map_err(|e: String| anyhow!(e))?,
            unit: value.unit.parse().map_err(|e: String| anyhow!(e))?,
            id: value.id,
            name: value.name,
            name_localized: value.name_localized,
            price: value.price,
            description: value.description,
            image: value.image,
            stock: value.stock,
            min_order_quantity: value.min_order_quantity,
            available: value.available,
            created_at: value.created_at,
            updated_at: value.updated_at,
        })
    }
}

// Delivery areas

#[derive(Queryable, Selectable, Identifiable, Debug, Clone)]
#[diesel(table_name = crate::schema::delivery_areas)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct DeliveryAreaEntity {
    pub id: Uuid,
    pub area: String,
    pub charge: Decimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Insertable, AsChangeset, Debug)]
#[diesel(table_name = crate::schema::delivery_areas)]
pub struct WriteDeliveryAreaEntity<'a> {
    pub area: &'a str,
    pub charge: Decimal,
}

impl<'a> From<&'a DeliveryAreaInput> for WriteDeliveryAreaEntity<'a> {
    fn from(value: &'a DeliveryAreaInput) -> Self {
        Self {
            area: value.area.trim(),
            charge: value.charge,
        }
    }
}

impl From<DeliveryAreaEntity> for DeliveryArea {
    fn from(value: DeliveryAreaEntity) -> Self {
        Self {
            id: value.id,
            area: value.area,
            charge: value.charge,
            created_at: value.created_at,
            updated_at: value.updated_at,
        }
    }
}

// Orders

#[derive(Queryable, Selectable, Identifiable, Debug, Clone)]
#[diesel(table_name = crate::schema::orders)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct OrderEntity {
    pub id: Uuid,
    pub order_number: String,
    pub customer_id: Uuid,
    pub delivery_address: Value,
    pub total_amount: Decimal,
    pub delivery_charge: Decimal,
    pub final_amount: Decimal,
    pub status: String,
    pub payment_status: String,
    pub payment_method: Option<String>,
    pub provider_order_id: Option<String>,
    pub provider_payment_id: Option<String>,
    pub delivery_date: Option<NaiveDate>,
    pub delivery_slot: Option<String>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Insertable, Debug)]
#[diesel(table_name = crate::schema::orders)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct CreateOrderEntity {
    pub id: Uuid,
    pub order_number: String,
    pub customer_id: Uuid,
    pub delivery_address: Value,
    pub total_amount: Decimal,
    pub delivery_charge: Decimal,
    pub final_amount: Decimal,
    pub status: String,
    pub payment_status: String,
    pub notes: Option<String>,
}

/// Sparse order update; `None` columns are left untouched.
#[derive(AsChangeset, Debug)]
#[diesel(table_name = crate::schema::orders)]
pub struct OrderChangeset {
    pub status: Option<String>,
    pub payment_status: Option<String>,
    pub payment_method: Option<String>,
    pub provider_order_id: Option<String>,
    pub provider_payment_id: Option<String>,
    pub delivery_date: Option<NaiveDate>,
    pub delivery_slot: Option<String>,
    pub updated_at: DateTime<Utc>,
}

impl From<&OrderPatch> for OrderChangeset {
    fn from(patch: &OrderPatch) -> Self {
        Self {
            status: patch.status.map(|s| s.as_str().to_string()),
            payment_status: patch.payment_status.map(|s| s.as_str().to_string()),
            payment_method: patch.payment_method.clone(),
            provider_order_id: patch.provider_order_id.clone(),
            provider_payment_id: patch.provider_payment_id.clone(),
            delivery_date: patch.delivery_date,
            delivery_slot: patch.delivery_slot.clone(),
            updated_at: Utc::now(),
        }
    }
}

impl TryFrom<OrderEntity> for Order {
    type Error = anyhow::Error;

    fn try_from(value: OrderEntity) -> Result<Self> {
        Ok(Self {
            delivery_address: serde_json::from_value(value.delivery_address)
                .context("Failed to decode delivery address snapshot")?,
            status: value.status.parse().map_err(|e: String| anyhow!(e))?,
            payment_status: value.payment_status.parse().map_err(|e: String| anyhow!(e))?,
            id: value.id,
            order_number: value.order_number,
            customer_id: value.customer_id,
            total_amount: value.total_amount,
            delivery_charge: value.delivery_charge,
            final_amount: value.final_amount,
            payment_method: value.payment_method,
            provider_order_id: value.provider_order_id,
            provider_payment_id: value.provider_payment_id,
            delivery_date: value.delivery_date,
            delivery_slot: value.delivery_slot,
            notes: value.notes,
            created_at: value.created_at,
            updated_at: value.updated_at,
        })
    }
}

// Order items

#[derive(Queryable, Selectable, Identifiable, Associations, Debug, Clone)]
#[diesel(belongs_to(OrderEntity, foreign_key = order_id))]
#[diesel(table_name = crate::schema::order_items)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct OrderItemEntity {
    pub id: Uuid,
    pub order_id: Uuid,
    pub product_id: String,
    pub position: i32,
    pub quantity: Decimal,
    pub price: Decimal,
    pub total: Decimal,
}

#[derive(Insertable, Debug)]
#[diesel(table_name = crate::schema::order_items)]
pub struct CreateOrderItemEntity {
    pub id: Uuid,
    pub order_id: Uuid,
    pub product_id: String,
    pub position: i32,
    pub quantity: Decimal,
    pub price: Decimal,
    pub total: Decimal,
}

impl OrderItemEntity {
    pub fn into_domain(self, product: Option<Product>) -> OrderItem {
        OrderItem {
            id: self.id,
            product_id: self.product_id,
            quantity: self.quantity,
            price: self.price,
            total: self.total,
            product,
        }
    }
}

// Outbox

#[derive(Queryable, Selectable, Identifiable, Debug, Clone)]
#[diesel(table_name = crate::schema::outbox)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct OutboxEntity {
    pub id: i32,
    pub event_type: String,
    pub payload: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Insertable, Debug)]
#[diesel(table_name = crate::schema::outbox)]
pub struct CreateOutboxEntity {
    pub event_type: String,
    pub payload: String,
    pub status: String,
}
