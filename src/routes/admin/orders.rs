use axum::{
    Json,
    extract::{Path, Query, State},
    response::IntoResponse,
};
use chrono::NaiveDate;
use serde::Deserialize;
use tracing::info;
use utoipa::IntoParams;
use utoipa_axum::router::OpenApiRouter;
use uuid::Uuid;

use crate::{
    app_error::{AppError, StdResponse},
    app_state::AppState,
    auth::AdminSession,
    domain::{OrderDetails, OrderStatus, OrderTransition},
    store::OrderFilter,
};

pub fn routes_with_openapi() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(utoipa_axum::routes!(list_orders))
        .routes(utoipa_axum::routes!(update_order))
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct OrderQuery {
    pub status: Option<OrderStatus>,
    /// Creation day (UTC), `YYYY-MM-DD`.
    pub date: Option<NaiveDate>,
}

/// List orders, newest first.
#[utoipa::path(
    get,
    path = "/orders",
    tags = ["Admin"],
    security(("bearerAuth" = [])),
    params(OrderQuery),
    responses(
        (status = 200, description = "List orders", body = StdResponse<Vec<OrderDetails>, String>),
        (status = 401, description = "Admin session required", body = StdResponse<String, String>)
    )
)]
async fn list_orders(
    _session: AdminSession,
    State(state): State<AppState>,
    Query(query): Query<OrderQuery>,
) -> Result<impl IntoResponse, AppError> {
    let filter = OrderFilter {
        status: query.status,
        date: query.date,
    };
    let orders = state.orders.list(&filter).await?;

    Ok(StdResponse {
        data: Some(orders),
        message: Some("Get orders successfully"),
    })
}

/// Apply a sparse status/delivery update to an order.
#[utoipa::path(
    patch,
    path = "/orders/{id}",
    tags = ["Admin"],
    security(("bearerAuth" = [])),
    params(
        ("id" = Uuid, Path, description = "Order ID to update")
    ),
    request_body = OrderTransition,
    responses(
        (status = 200, description = "Order updated", body = StdResponse<OrderDetails, String>),
        (status = 404, description = "Order not found", body = StdResponse<String, String>)
    )
)]
async fn update_order(
    session: AdminSession,
    Path(id): Path<Uuid>,
    State(state): State<AppState>,
    Json(change): Json<OrderTransition>,
) -> Result<impl IntoResponse, AppError> {
    let order = state.orders.transition(id, change).await?;
    info!(order_id = %id, by = %session.subject, "Order updated from admin");

    Ok(StdResponse {
        data: Some(order),
        message: Some("Order updated successfully"),
    })
}
