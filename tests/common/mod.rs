#![allow(dead_code)]

use std::{
    sync::{
        Arc, Mutex,
        atomic::{AtomicBool, AtomicUsize, Ordering},
    },
    time::Duration,
};

use anyhow::{Result, anyhow};
use async_trait::async_trait;
use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
};
use http_body_util::BodyExt;
use rust_decimal::{Decimal, dec};
use seafood_orderservice::{
    api::{PaymentProvider, PaymentSession, ProviderError, SessionRequest},
    app_state::AppState,
    auth::StaticTokenProvider,
    config::{NotificationConfig, NotifierKind, OrderConfig, RazorpayConfig},
    domain::{
        OrderDetails, OrderStatus, ProductCategory,
        catalog::{ProductInput, ProductUnit},
    },
    notifications::{Notifier, OutboxDispatcher},
    routes,
    store::{CatalogStore, MemoryStore},
};
use serde_json::{Value, json};
use tower::ServiceExt;

pub const KEY_SECRET: &str = "test_secret";
pub const ADMIN_TOKEN: &str = "admin-token-1";

#[derive(Default)]
pub struct StubProvider {
    pub fail: AtomicBool,
    pub requests: Mutex<Vec<SessionRequest>>,
    counter: AtomicUsize,
}

#[async_trait]
impl PaymentProvider for StubProvider {
    fn name(&self) -> &'static str {
        "razorpay"
    }

    async fn create_session(&self, request: &SessionRequest) -> Result<PaymentSession, ProviderError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(ProviderError::Unreachable("connection refused".into()));
        }
        self.requests.lock().unwrap().push(request.clone());
        let n = self.counter.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(PaymentSession {
            id: format!("order_test_{n}"),
            amount: request.amount,
            currency: request.currency.clone(),
        })
    }
}

#[derive(Default)]
pub struct RecordingNotifier {
    pub sent: Mutex<Vec<String>>,
}

impl RecordingNotifier {
    pub fn sent(&self) -> Vec<String> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn order_confirmation(&self, order: &OrderDetails) -> Result<()> {
        self.sent
            .lock()
            .map_err(|_| anyhow!("poisoned"))?
            .push(format!("confirmation:{}", order.order.order_number));
        Ok(())
    }

    async fn status_update(&self, _order: &OrderDetails, status: OrderStatus) -> Result<()> {
        self.sent
            .lock()
            .map_err(|_| anyhow!("poisoned"))?
            .push(format!("status:{status}"));
        Ok(())
    }
}

pub struct Harness {
    pub app: Router,
    pub store: Arc<MemoryStore>,
    pub provider: Arc<StubProvider>,
    pub notifier: Arc<RecordingNotifier>,
    pub dispatcher: OutboxDispatcher,
}

pub fn razorpay_config() -> RazorpayConfig {
    RazorpayConfig {
        key_id: "rzp_test_key".into(),
        key_secret: KEY_SECRET.into(),
        api_url: "http://127.0.0.1:9".into(),
        currency: "INR".into(),
        reconcile_timeout: Duration::from_secs(2),
    }
}

impl Harness {
    pub async fn new() -> Self {
        Self::with_orders(OrderConfig::default()).await
    }

    pub async fn with_orders(orders: OrderConfig) -> Self {
        Self::build(orders, razorpay_config()).await
    }

    pub async fn with_reconcile_timeout(timeout: Duration) -> Self {
        let razorpay = RazorpayConfig {
            reconcile_timeout: timeout,
            ..razorpay_config()
        };
        Self::build(OrderConfig::default(), razorpay).await
    }

    async fn build(orders: OrderConfig, razorpay: RazorpayConfig) -> Self {
        let store = Arc::new(MemoryStore::new());
        seed(&store).await;

        let provider = Arc::new(StubProvider::default());
        let notifier = Arc::new(RecordingNotifier::default());
        let sessions = Arc::new(StaticTokenProvider::new(vec![ADMIN_TOKEN.into()]));
        let state = AppState::new(
            store.clone(),
            provider.clone(),
            sessions,
            &razorpay,
            &orders,
        );
        let dispatcher = OutboxDispatcher::new(
            store.clone(),
            notifier.clone(),
            &NotificationConfig {
                kind: NotifierKind::Log,
                smtp: None,
                amqp_url: None,
                amqp_queue: "notifications.orders".into(),
                poll_interval: Duration::from_millis(10),
                batch_size: 50,
                lease: Duration::from_secs(300),
            },
        );

        Self {
            app: routes::app(state),
            store,
            provider,
            notifier,
            dispatcher,
        }
    }

    pub async fn send(&self, req: Request<Body>) -> (StatusCode, Value) {
        let res = self.app.clone().oneshot(req).await.unwrap();
        let status = res.status();
        let bytes = res.into_body().collect().await.unwrap().to_bytes();
        (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
    }

    pub async fn get(&self, uri: &str) -> (StatusCode, Value) {
        self.send(Request::get(uri).body(Body::empty()).unwrap()).await
    }

    pub async fn post(&self, uri: &str, body: Value) -> (StatusCode, Value) {
        self.send(json_request("POST", uri, body, None)).await
    }

    pub async fn admin(&self, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let req = match body {
            Some(body) => json_request(method, uri, body, Some(ADMIN_TOKEN)),
            None => Request::builder()
                .method(method)
                .uri(uri)
                .header(header::AUTHORIZATION, format!("Bearer {ADMIN_TOKEN}"))
                .body(Body::empty())
                .unwrap(),
        };
        self.send(req).await
    }

    /// Places the reference order: one crab at 750 plus a delivery charge of 50.
    pub async fn place_order(&self) -> Value {
        let (status, body) = self.post("/orders", checkout("9820012345", "12 Lake Road")).await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        body["data"].clone()
    }

    /// Delivers all queued notifications and returns everything sent so far.
    pub async fn flush_notifications(&self) -> Vec<String> {
        self.dispatcher.run_once().await.unwrap();
        self.notifier.sent()
    }
}

pub fn json_request(method: &str, uri: &str, body: Value, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

pub fn checkout(phone: &str, address: &str) -> Value {
    json!({
        "customer": {
            "name": "Asha Patil",
            "phone": phone,
            "email": "asha@example.com",
            "address": address,
            "area": "Bhandup",
            "pincode": "400078"
        },
        "items": [
            { "productId": "crab-1", "quantity": 1, "price": 750, "total": 750 }
        ],
        "deliveryCharge": 50
    })
}

pub fn decimal(value: &Value) -> Decimal {
    match value {
        Value::String(s) => s.parse().unwrap(),
        Value::Number(n) => n.to_string().parse().unwrap(),
        other => panic!("not a decimal: {other}"),
    }
}

async fn seed(store: &MemoryStore) {
    let products = [
        ("crab-1", "Black Crab", ProductCategory::BlackCrabs, dec!(750), dec!(1), true),
        ("fish-1", "Pomfret", ProductCategory::Fish, dec!(450), dec!(0.5), true),
        ("lobster-1", "Rock Lobster", ProductCategory::Lobsters, dec!(2200), dec!(0.5), false),
    ];
    for (id, name, category, price, min_order_quantity, available) in products {
        store
            .insert_product(
                id.into(),
                &ProductInput {
                    id: None,
                    name: name.into(),
                    name_localized: None,
                    category,
                    price,
                    unit: ProductUnit::Kg,
                    description: String::new(),
                    image: String::new(),
                    stock: 20,
                    min_order_quantity,
                    available,
                },
            )
            .await
            .unwrap();
    }
}
