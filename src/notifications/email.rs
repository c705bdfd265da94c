use anyhow::{Context, Result};
use async_trait::async_trait;
use lettre::{
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
    message::{Mailbox, header::ContentType},
    transport::smtp::authentication::Credentials,
};
use tracing::info;

use crate::{
    config::SmtpConfig,
    domain::{OrderDetails, OrderStatus},
    notifications::{Notifier, recipient},
};

const STORE_NAME: &str = "Sarphare Khekdewala";

pub struct SmtpNotifier {
    mailer: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl SmtpNotifier {
    pub fn new(config: &SmtpConfig) -> Result<Self> {
        let credentials = Credentials::new(config.user.clone(), config.password.clone());
        let mailer = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)
            .with_context(|| format!("Invalid SMTP host `{}`", config.host))?
            .port(config.port)
            .credentials(credentials)
            .build();
        let from = config
            .from
            .parse()
            .with_context(|| format!("Invalid EMAIL_FROM address `{}`", config.from))?;

        Ok(Self { mailer, from })
    }

    async fn send(&self, order: &OrderDetails, subject: String, html: String) -> Result<()> {
        let to = recipient(order);
        let message = Message::builder()
            .from(self.from.clone())
            .to(to
                .parse()
                .with_context(|| format!("Invalid recipient address `{to}`"))?)
            .subject(subject)
            .header(ContentType::TEXT_HTML)
            .body(html)
            .context("Failed to build email")?;

        self.mailer
            .send(message)
            .await
            .context("Failed to send email")?;
        info!(order_number = %order.order.order_number, "Email sent to {}", to);
        Ok(())
    }
}

#[async_trait]
impl Notifier for SmtpNotifier {
    async fn order_confirmation(&self, order: &OrderDetails) -> Result<()> {
        let subject = format!("Order Confirmation - {}", order.order.order_number);
        self.send(order, subject, confirmation_html(order)).await
    }

    async fn status_update(&self, order: &OrderDetails, status: OrderStatus) -> Result<()> {
        let subject = format!("Order Status Update - {}", order.order.order_number);
        self.send(order, subject, status_update_html(order, status))
            .await
    }
}

pub fn confirmation_html(details: &OrderDetails) -> String {
    let order = &details.order;
    let address = &order.delivery_address;

    let items: String = details
        .items
        .iter()
        .map(|item| {
            let (name, unit) = match &item.product {
                Some(product) => (product.name.as_str(), product.unit.as_str()),
                None => (item.product_id.as_str(), ""),
            };
            format!(
                r#"<div style="border-bottom: 1px solid #eee; padding: 10px 0;">
  <p><strong>{}</strong></p>
  <p>Quantity: {} {} &times; &#8377;{} = &#8377;{:.2}</p>
</div>"#,
                escape(name),
                item.quantity.normalize(),
                unit,
                item.price,
                item.total
            )
        })
        .collect();

    format!(
        r#"<div style="font-family: Arial, sans-serif; max-width: 600px; margin: 0 auto;">
<div style="background-color: #1890ff; color: white; padding: 20px; text-align: center;">
  <h1>{store}</h1>
  <p>Fresh Seafood Delivered</p>
</div>
<div style="padding: 20px; background-color: #f5f5f5;">
  <h2>Thank you for your order!</h2>
  <p>Dear {name},</p>
  <div style="background-color: white; padding: 15px; margin: 20px 0;">
    <h3>Order Details</h3>
    <p><strong>Order Number:</strong> {number}</p>
    <p><strong>Order Date:</strong> {date}</p>
    <p><strong>Total Amount:</strong> &#8377;{total:.2}</p>
    <p><strong>Payment Status:</strong> {payment}</p>
    <p><strong>Order Status:</strong> {status}</p>
  </div>
  <div style="background-color: white; padding: 15px; margin: 20px 0;">
    <h3>Delivery Address</h3>
    <p>{street}</p>
    <p>{area} - {pincode}</p>
    <p>Phone: {phone}</p>
  </div>
  <div style="background-color: white; padding: 15px; margin: 20px 0;">
    <h3>Items Ordered</h3>
    {items}
    <p style="font-size: 18px;"><strong>Final Amount: &#8377;{total:.2}</strong></p>
  </div>
  <p>We will contact you shortly to confirm the delivery time.</p>
</div>
</div>"#,
        store = STORE_NAME,
        name = escape(&address.name),
        number = order.order_number,
        date = order.created_at.format("%d %b %Y %H:%M UTC"),
        total = order.final_amount,
        payment = order.payment_status,
        status = order.status,
        street = escape(&address.address),
        area = escape(&address.area),
        pincode = address.pincode,
        phone = address.phone,
        items = items,
    )
}

pub fn status_update_html(details: &OrderDetails, status: OrderStatus) -> String {
    format!(
        r#"<div style="font-family: Arial, sans-serif; max-width: 600px; margin: 0 auto;">
<div style="background-color: #1890ff; color: white; padding: 20px; text-align: center;">
  <h1>Order Status Update</h1>
</div>
<div style="padding: 20px; background-color: #f5f5f5;">
  <p>Dear {name},</p>
  <p style="font-size: 16px;"><strong>{message}</strong></p>
  <div style="background-color: white; padding: 15px; margin: 20px 0;">
    <p><strong>Order Number:</strong> {number}</p>
    <p><strong>Current Status:</strong> {status}</p>
  </div>
  <p>Thank you for choosing {store}!</p>
</div>
</div>"#,
        name = escape(&details.order.delivery_address.name),
        message = status.customer_message(),
        number = details.order.order_number,
        status = status,
        store = STORE_NAME,
    )
}

fn escape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Customer, DeliveryAddress, Order, OrderItem, PaymentStatus};
    use chrono::Utc;
    use rust_decimal::dec;
    use uuid::Uuid;

    fn details() -> OrderDetails {
        let now = Utc::now();
        let address = DeliveryAddress {
            name: "Asha <Patil>".into(),
            phone: "9820012345".into(),
            email: None,
            address: "12 Lake Road".into(),
            area: "Bhandup".into(),
            pincode: "400078".into(),
        };
        OrderDetails {
            order: Order {
                id: Uuid::new_v4(),
                order_number: "ORD-LOYW3V28-AB12C".into(),
                customer_id: Uuid::nil(),
                delivery_address: address.clone(),
                total_amount: dec!(750),
                delivery_charge: dec!(50),
                final_amount: dec!(800),
                status: OrderStatus::Pending,
                payment_status: PaymentStatus::Pending,
                payment_method: None,
                provider_order_id: None,
                provider_payment_id: None,
                delivery_date: None,
                delivery_slot: None,
                notes: None,
                created_at: now,
                updated_at: now,
            },
            customer: Customer {
                id: Uuid::nil(),
                name: address.name,
                phone: address.phone,
                email: None,
                address: address.address,
                area: address.area,
                pincode: address.pincode,
                created_at: now,
                updated_at: now,
            },
            items: vec![OrderItem {
                id: Uuid::new_v4(),
                product_id: "crab-1".into(),
                quantity: dec!(1.0),
                price: dec!(750),
                total: dec!(750),
                product: None,
            }],
        }
    }

    #[test]
    fn confirmation_lists_totals_and_escapes_names() {
        let html = confirmation_html(&details());
        assert!(html.contains("ORD-LOYW3V28-AB12C"));
        assert!(html.contains("&#8377;800.00"));
        assert!(html.contains("Asha &lt;Patil&gt;"));
        assert!(html.contains("crab-1"));
    }

    #[test]
    fn status_update_uses_customer_message() {
        let html = status_update_html(&details(), OrderStatus::OutForDelivery);
        assert!(html.contains(OrderStatus::OutForDelivery.customer_message()));
        assert!(html.contains("out_for_delivery"));
    }

    #[test]
    fn placeholder_recipient_without_email() {
        assert_eq!(recipient(&details()), "9820012345@example.com");
    }
}
