use axum::{
    Json,
    extract::{Path, State},
    response::IntoResponse,
};
use utoipa_axum::router::OpenApiRouter;
use uuid::Uuid;

use crate::{
    app_error::{AppError, Created, StdResponse},
    app_state::AppState,
    domain::{CreateOrderInput, OrderDetails},
};

/// Storefront order routes.
pub fn routes_with_openapi() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(utoipa_axum::routes!(create_order))
        .routes(utoipa_axum::routes!(get_order))
}

/// Place an order from the cart and checkout form.
#[utoipa::path(
    post,
    path = "/orders",
    tags = ["Orders"],
    request_body = CreateOrderInput,
    responses(
        (status = 201, description = "Order placed", body = StdResponse<OrderDetails, String>),
        (status = 400, description = "Invalid checkout data", body = StdResponse<String, String>)
    )
)]
async fn create_order(
    State(state): State<AppState>,
    Json(input): Json<CreateOrderInput>,
) -> Result<impl IntoResponse, AppError> {
    let order = state.orders.create(input).await?;

    Ok(Created(StdResponse {
        data: Some(order),
        message: Some("Order placed successfully"),
    }))
}

/// Fetch one order with its customer and line items.
#[utoipa::path(
    get,
    path = "/orders/{id}",
    tags = ["Orders"],
    params(
        ("id" = Uuid, Path, description = "Order ID")
    ),
    responses(
        (status = 200, description = "Get order successfully", body = StdResponse<OrderDetails, String>),
        (status = 404, description = "Order not found", body = StdResponse<String, String>)
    )
)]
async fn get_order(
    Path(id): Path<Uuid>,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    let order = state.orders.get(id).await?;

    Ok(StdResponse {
        data: Some(order),
        message: Some("Get order successfully"),
    })
}
