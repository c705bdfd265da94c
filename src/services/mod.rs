//! Order lifecycle, payment bridge and the admin-side catalog and reporting services.
//! These are the only write paths into the store.

pub mod catalog;
pub mod orders;
pub mod payments;
pub mod reports;

use rust_decimal::Decimal;
use thiserror::Error;
use uuid::Uuid;

use crate::store::StoreError;

pub use catalog::CatalogService;
pub use orders::OrderLifecycle;
pub use payments::PaymentBridge;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("{0}")]
    Validation(String),

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("storage failure: {0}")]
    Persistence(#[source] StoreError),

    #[error("payment provider failure: {0}")]
    PaymentProvider(String),

    #[error("amount {actual} does not match the order total {expected}")]
    AmountMismatch { expected: Decimal, actual: Decimal },

    #[error("payment signature mismatch")]
    SignatureMismatch,

    /// The provider captured the payment but the local record could not be written.
    #[error(
        "payment {provider_payment_id} (provider order {provider_order_id}) for order {order_id} \
         was captured but not recorded: {reason}"
    )]
    ReconciliationAmbiguous {
        order_id: Uuid,
        provider_order_id: String,
        provider_payment_id: String,
        reason: String,
    },
}

pub type ServiceResult<T> = Result<T, ServiceError>;

impl From<StoreError> for ServiceError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound => ServiceError::NotFound("record"),
            other => ServiceError::Persistence(other),
        }
    }
}
