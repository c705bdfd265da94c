use axum::{extract::State, response::IntoResponse};
use chrono::Utc;
use utoipa_axum::router::OpenApiRouter;

use crate::{
    app_error::{AppError, StdResponse},
    app_state::AppState,
    auth::AdminSession,
    domain::CustomerSummary,
    services::reports::DashboardStats,
    store::OrderFilter,
};

pub fn routes_with_openapi() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(utoipa_axum::routes!(list_customers))
        .routes(utoipa_axum::routes!(get_stats))
}

/// Customers with how many orders each has placed, newest first.
#[utoipa::path(
    get,
    path = "/customers",
    tags = ["Admin"],
    security(("bearerAuth" = [])),
    responses(
        (status = 200, description = "List customers", body = StdResponse<Vec<CustomerSummary>, String>)
    )
)]
async fn list_customers(
    _session: AdminSession,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    let customers = state.orders.customers().await?;

    Ok(StdResponse {
        data: Some(customers),
        message: Some("Get customers successfully"),
    })
}

/// Dashboard counters.
#[utoipa::path(
    get,
    path = "/stats",
    tags = ["Admin"],
    security(("bearerAuth" = [])),
    responses(
        (status = 200, description = "Dashboard stats", body = StdResponse<DashboardStats, String>)
    )
)]
async fn get_stats(
    _session: AdminSession,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    let orders = state.orders.list(&OrderFilter::default()).await?;

    Ok(StdResponse {
        data: Some(DashboardStats::from_orders(&orders, Utc::now())),
        message: Some("Get stats successfully"),
    })
}
