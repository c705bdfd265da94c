use axum::{Json, extract::State, response::IntoResponse};
use rust_decimal::Decimal;
use serde::Deserialize;
use utoipa::ToSchema;
use utoipa_axum::router::OpenApiRouter;
use uuid::Uuid;

use crate::{
    app_error::{AppError, StdResponse},
    app_state::AppState,
    domain::OrderDetails,
    services::payments::{CheckoutSession, PaymentConfirmation},
};

pub fn routes_with_openapi() -> OpenApiRouter<AppState> {
    OpenApiRouter::new().nest(
        "/payments/razorpay",
        OpenApiRouter::new()
            .routes(utoipa_axum::routes!(create_payment))
            .routes(utoipa_axum::routes!(verify_payment)),
    )
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreatePaymentReq {
    pub order_id: Uuid,
    /// Rupees; must equal the order's final amount.
    pub amount: Decimal,
}

/// Open a hosted checkout session for an unpaid order.
#[utoipa::path(
    post,
    path = "/create-order",
    tags = ["Payments"],
    request_body = CreatePaymentReq,
    responses(
        (status = 200, description = "Payment session created", body = StdResponse<CheckoutSession, String>),
        (status = 400, description = "Amount does not match the order", body = StdResponse<String, String>),
        (status = 502, description = "Payment provider failure", body = StdResponse<String, String>)
    )
)]
async fn create_payment(
    State(state): State<AppState>,
    Json(req): Json<CreatePaymentReq>,
) -> Result<impl IntoResponse, AppError> {
    let session = state.payments.initiate(req.order_id, req.amount).await?;

    Ok(StdResponse {
        data: Some(session),
        message: Some("Payment session created"),
    })
}

/// Verify the provider's success callback and mark the order paid.
#[utoipa::path(
    post,
    path = "/verify",
    tags = ["Payments"],
    request_body = PaymentConfirmation,
    responses(
        (status = 200, description = "Payment verified", body = StdResponse<OrderDetails, String>),
        (status = 400, description = "Payment verification failed", body = StdResponse<String, String>),
        (status = 500, description = "Payment captured but not yet recorded", body = StdResponse<String, String>)
    )
)]
async fn verify_payment(
    State(state): State<AppState>,
    Json(confirmation): Json<PaymentConfirmation>,
) -> Result<impl IntoResponse, AppError> {
    let order = state.payments.verify(confirmation).await?;

    Ok(StdResponse {
        data: Some(order),
        message: Some("Payment verified successfully"),
    })
}
