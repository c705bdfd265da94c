use chrono::{DateTime, Datelike, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use utoipa::ToSchema;

use crate::domain::{OrderDetails, OrderStatus};

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StatusCount {
    pub status: OrderStatus,
    pub count: usize,
}

/// Admin dashboard counters. Revenue only counts paid orders; "today" and "month" are
/// UTC calendar boundaries.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub total_orders: usize,
    pub total_revenue: Decimal,
    pub pending_orders: usize,
    pub delivered_orders: usize,
    pub today_orders: usize,
    pub today_revenue: Decimal,
    pub month_revenue: Decimal,
    pub by_status: Vec<StatusCount>,
}

impl DashboardStats {
    pub fn from_orders(orders: &[OrderDetails], now: DateTime<Utc>) -> Self {
        let today = now.date_naive();
        let mut stats = DashboardStats {
            total_orders: orders.len(),
            total_revenue: Decimal::ZERO,
            pending_orders: 0,
            delivered_orders: 0,
            today_orders: 0,
            today_revenue: Decimal::ZERO,
            month_revenue: Decimal::ZERO,
            by_status: OrderStatus::ALL
                .iter()
                .map(|status| StatusCount {
                    status: *status,
                    count: 0,
                })
                .collect(),
        };

        for details in orders {
            let order = &details.order;
            let created = order.created_at.date_naive();
            let is_today = created == today;
            let is_this_month = created.year() == today.year() && created.month() == today.month();

            if order.status.is_open() {
                stats.pending_orders += 1;
            }
            if order.status == OrderStatus::Delivered {
                stats.delivered_orders += 1;
            }
            if is_today {
                stats.today_orders += 1;
            }
            if order.is_paid() {
                stats.total_revenue += order.final_amount;
                if is_today {
                    stats.today_revenue += order.final_amount;
                }
                if is_this_month {
                    stats.month_revenue += order.final_amount;
                }
            }
            if let Some(entry) = stats.by_status.iter_mut().find(|e| e.status == order.status) {
                entry.count += 1;
            }
        }
        stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Customer, DeliveryAddress, Order, PaymentStatus};
    use chrono::TimeZone;
    use rust_decimal::dec;
    use uuid::Uuid;

    fn order(
        created_at: DateTime<Utc>,
        status: OrderStatus,
        payment_status: PaymentStatus,
        amount: Decimal,
    ) -> OrderDetails {
        let address = DeliveryAddress {
            name: "Ravi".into(),
            phone: "9000000000".into(),
            email: None,
            address: "1 Shore Road".into(),
            area: "Thane".into(),
            pincode: "400601".into(),
        };
        OrderDetails {
            order: Order {
                id: Uuid::new_v4(),
                order_number: "ORD-X-00000".into(),
                customer_id: Uuid::nil(),
                delivery_address: address.clone(),
                total_amount: amount,
                delivery_charge: Decimal::ZERO,
                final_amount: amount,
                status,
                payment_status,
                payment_method: None,
                provider_order_id: None,
                provider_payment_id: None,
                delivery_date: None,
                delivery_slot: None,
                notes: None,
                created_at,
                updated_at: created_at,
            },
            customer: Customer {
                id: Uuid::nil(),
                name: address.name,
                phone: address.phone,
                email: None,
                address: address.address,
                area: address.area,
                pincode: address.pincode,
                created_at,
                updated_at: created_at,
            },
            items: vec![],
        }
    }

    #[test]
    fn revenue_counts_paid_orders_only() {
        let now = Utc.with_ymd_and_hms(2025, 3, 15, 12, 0, 0).unwrap();
        let earlier_this_month = Utc.with_ymd_and_hms(2025, 3, 2, 9, 0, 0).unwrap();
        let last_month = Utc.with_ymd_and_hms(2025, 2, 27, 9, 0, 0).unwrap();

        let orders = vec![
            order(now, OrderStatus::Confirmed, PaymentStatus::Paid, dec!(800)),
            order(now, OrderStatus::Pending, PaymentStatus::Pending, dec!(300)),
            order(earlier_this_month, OrderStatus::Delivered, PaymentStatus::Paid, dec!(1200)),
            order(last_month, OrderStatus::Cancelled, PaymentStatus::Paid, dec!(500)),
        ];
        let stats = DashboardStats::from_orders(&orders, now);

        assert_eq!(stats.total_orders, 4);
        assert_eq!(stats.total_revenue, dec!(2500));
        assert_eq!(stats.today_orders, 2);
        assert_eq!(stats.today_revenue, dec!(800));
        assert_eq!(stats.month_revenue, dec!(2000));
        assert_eq!(stats.pending_orders, 2);
        assert_eq!(stats.delivered_orders, 1);

        let cancelled = stats
            .by_status
            .iter()
            .find(|e| e.status == OrderStatus::Cancelled)
            .unwrap();
        assert_eq!(cancelled.count, 1);
        assert_eq!(stats.by_status.len(), OrderStatus::ALL.len());
    }
}
