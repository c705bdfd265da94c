//! Order, line item and customer types plus the status axes.

use std::{fmt, str::FromStr};

use chrono::{DateTime, NaiveDate, Utc};
use rand::Rng;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::domain::catalog::Product;

/// Fulfillment status.
///
/// Transitions are deliberately open: staff may move an order from any status to any
/// other to correct mistakes. The conventional path is
/// `pending → confirmed → processing → out_for_delivery → delivered`, with `cancelled`
/// reachable from any non-terminal status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    #[default]
    Pending,
    Confirmed,
    Processing,
    #[serde(alias = "out-for-delivery")]
    OutForDelivery,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    pub const ALL: [OrderStatus; 6] = [
        OrderStatus::Pending,
        OrderStatus::Confirmed,
        OrderStatus::Processing,
        OrderStatus::OutForDelivery,
        OrderStatus::Delivered,
        OrderStatus::Cancelled,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Confirmed => "confirmed",
            OrderStatus::Processing => "processing",
            OrderStatus::OutForDelivery => "out_for_delivery",
            OrderStatus::Delivered => "delivered",
            OrderStatus::Cancelled => "cancelled",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Delivered | OrderStatus::Cancelled)
    }

    /// Still counted as "open" work on the dashboard.
    pub fn is_open(&self) -> bool {
        matches!(
            self,
            OrderStatus::Pending | OrderStatus::Confirmed | OrderStatus::Processing
        )
    }

    /// Customer-facing sentence used in status-update notifications.
    pub fn customer_message(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "We have received your order and are reviewing it.",
            OrderStatus::Confirmed => "Your order has been confirmed and is being prepared.",
            OrderStatus::Processing => "Your order is currently being processed.",
            OrderStatus::OutForDelivery => {
                "Your order is out for delivery! Our delivery person will reach you soon."
            }
            OrderStatus::Delivered => {
                "Your order has been delivered successfully. Thank you for your purchase!"
            }
            OrderStatus::Cancelled => {
                "Your order has been cancelled. Please contact us for any queries."
            }
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(OrderStatus::Pending),
            "confirmed" => Ok(OrderStatus::Confirmed),
            "processing" => Ok(OrderStatus::Processing),
            "out_for_delivery" | "out-for-delivery" => Ok(OrderStatus::OutForDelivery),
            "delivered" => Ok(OrderStatus::Delivered),
            "cancelled" => Ok(OrderStatus::Cancelled),
            other => Err(format!("unknown order status `{other}`")),
        }
    }
}

/// Payment axis, independent of [`OrderStatus`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    #[default]
    Pending,
    Paid,
    Failed,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "pending",
            PaymentStatus::Paid => "paid",
            PaymentStatus::Failed => "failed",
        }
    }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaymentStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(PaymentStatus::Pending),
            "paid" => Ok(PaymentStatus::Paid),
            "failed" => Ok(PaymentStatus::Failed),
            other => Err(format!("unknown payment status `{other}`")),
        }
    }
}

/// Generates a human-readable order number: `ORD-<base36 millis>-<5 base36 chars>`,
/// uppercased.
pub fn generate_order_number() -> String {
    let millis = Utc::now().timestamp_millis().max(0) as u64;
    let mut rng = rand::thread_rng();
    let suffix: String = (0..5)
        .map(|_| {
            let digit = rng.gen_range(0..36u32);
            char::from_digit(digit, 36).unwrap_or('0')
        })
        .collect();
    format!("ORD-{}-{}", to_base36(millis), suffix).to_uppercase()
}

fn to_base36(mut value: u64) -> String {
    if value == 0 {
        return "0".into();
    }
    let mut digits = Vec::new();
    while value > 0 {
        digits.push(char::from_digit((value % 36) as u32, 36).unwrap_or('0'));
        value /= 36;
    }
    digits.iter().rev().collect()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Customer {
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

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CustomerSummary {
    #[serde(flatten)]
    pub customer: Customer,
    pub order_count: i64,
}

/// Where and to whom an order ships, frozen at creation time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DeliveryAddress {
    pub name: String,
    pub phone: String,
    pub email: Option<String>,
    pub address: String,
    pub area: String,
    pub pincode: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: Uuid,
    pub order_number: String,
    pub customer_id: Uuid,
    pub delivery_address: DeliveryAddress,
    /// Sum of line totals.
    pub total_amount: Decimal,
    pub delivery_charge: Decimal,
    /// `total_amount + delivery_charge`, fixed at creation.
    pub final_amount: Decimal,
    pub status: OrderStatus,
    pub payment_status: PaymentStatus,
    pub payment_method: Option<String>,
    pub provider_order_id: Option<String>,
    pub provider_payment_id: Option<String>,
    pub delivery_date: Option<NaiveDate>,
    pub delivery_slot: Option<String>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    pub fn is_paid(&self) -> bool {
        self.payment_status == PaymentStatus::Paid
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    pub id: Uuid,
    pub product_id: String,
    pub quantity: Decimal,
    /// Unit price snapshot taken when the order was placed.
    pub price: Decimal,
    pub total: Decimal,
    /// Current catalog record, if the product still exists.
    pub product: Option<Product>,
}

/// An order joined with its customer and line items.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OrderDetails {
    #[serde(flatten)]
    pub order: Order,
    pub customer: Customer,
    pub items: Vec<OrderItem>,
}

/// Sparse update: `None` fields keep their stored value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrderPatch {
    pub status: Option<OrderStatus>,
    pub payment_status: Option<PaymentStatus>,
    pub payment_method: Option<String>,
    pub provider_order_id: Option<String>,
    pub provider_payment_id: Option<String>,
    pub delivery_date: Option<NaiveDate>,
    pub delivery_slot: Option<String>,
}

impl OrderPatch {
    pub fn is_empty(&self) -> bool {
        *self == OrderPatch::default()
    }
}

/// Staff-facing transition payload. Only present keys are applied.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OrderTransition {
    pub status: Option<OrderStatus>,
    pub payment_status: Option<PaymentStatus>,
    pub provider_payment_id: Option<String>,
    pub delivery_date: Option<NaiveDate>,
    pub delivery_slot: Option<String>,
}

impl OrderTransition {
    pub fn into_patch(self) -> OrderPatch {
        OrderPatch {
            status: self.status,
            payment_status: self.payment_status,
            provider_payment_id: self.provider_payment_id,
            delivery_date: self.delivery_date,
            delivery_slot: self.delivery_slot,
            ..OrderPatch::default()
        }
    }
}

/// Outcome of a verified payment, recorded exactly once per order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentRecord {
    pub provider_payment_id: String,
    pub payment_method: String,
}

impl PaymentRecord {
    /// The sparse update a verified payment applies to its order.
    pub fn as_patch(&self) -> OrderPatch {
        OrderPatch {
            status: Some(OrderStatus::Confirmed),
            payment_status: Some(PaymentStatus::Paid),
            payment_method: Some(self.payment_method.clone()),
            provider_payment_id: Some(self.provider_payment_id.clone()),
            ..OrderPatch::default()
        }
    }
}
