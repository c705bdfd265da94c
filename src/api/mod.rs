//! Outbound HTTP clients for services this one depends on.

pub mod razorpay;

pub use razorpay::{PaymentProvider, PaymentSession, ProviderError, RazorpayClient, SessionRequest};
