use std::sync::Arc;

use crate::{
    api::PaymentProvider,
    auth::SessionProvider,
    config::{OrderConfig, RazorpayConfig},
    services::{CatalogService, OrderLifecycle, PaymentBridge},
    store::Store,
};

/// Shared handles given to every request handler.
#[derive(Clone)]
pub struct AppState {
    pub orders: Arc<OrderLifecycle>,
    pub payments: Arc<PaymentBridge>,
    pub catalog: Arc<CatalogService>,
    pub sessions: Arc<dyn SessionProvider>,
}

impl AppState {
    pub fn new(
        store: Arc<dyn Store>,
        provider: Arc<dyn PaymentProvider>,
        sessions: Arc<dyn SessionProvider>,
        razorpay: &RazorpayConfig,
        orders: &OrderConfig,
    ) -> Self {
        let lifecycle = Arc::new(OrderLifecycle::new(store.clone(), orders));
        Self {
            payments: Arc::new(PaymentBridge::new(lifecycle.clone(), provider, razorpay)),
            catalog: Arc::new(CatalogService::new(store)),
            orders: lifecycle,
            sessions,
        }
    }
}
