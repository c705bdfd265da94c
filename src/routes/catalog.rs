use axum::{
    extract::{Query, State},
    response::IntoResponse,
};
use serde::Deserialize;
use utoipa::IntoParams;
use utoipa_axum::router::OpenApiRouter;

use crate::{
    app_error::{AppError, StdResponse},
    app_state::AppState,
    domain::{CategoryGroup, DeliveryArea, Product},
};

/// Public catalog reads used by the storefront and checkout.
pub fn routes_with_openapi() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(utoipa_axum::routes!(list_products))
        .routes(utoipa_axum::routes!(list_delivery_areas))
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ProductQuery {
    /// `mud-crabs` or `fresh-fish`; all groups when absent.
    pub category: Option<CategoryGroup>,
}

/// List orderable products.
#[utoipa::path(
    get,
    path = "/products",
    tags = ["Catalog"],
    params(ProductQuery),
    responses(
        (status = 200, description = "List products", body = StdResponse<Vec<Product>, String>)
    )
)]
async fn list_products(
    State(state): State<AppState>,
    Query(query): Query<ProductQuery>,
) -> Result<impl IntoResponse, AppError> {
    let products = state.catalog.storefront_products(query.category).await?;

    Ok(StdResponse {
        data: Some(products),
        message: Some("Get products successfully"),
    })
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct AreaQuery {
    /// Exact area name chosen at checkout.
    pub name: Option<String>,
}

/// List delivery areas with their flat charges, or look one up by name.
#[utoipa::path(
    get,
    path = "/delivery-areas",
    tags = ["Catalog"],
    params(AreaQuery),
    responses(
        (status = 200, description = "List delivery areas", body = StdResponse<Vec<DeliveryArea>, String>),
        (status = 404, description = "No area with that name", body = StdResponse<String, String>)
    )
)]
async fn list_delivery_areas(
    State(state): State<AppState>,
    Query(query): Query<AreaQuery>,
) -> Result<impl IntoResponse, AppError> {
    let areas = match query.name {
        Some(name) => vec![state.catalog.find_area_by_name(&name).await?],
        None => state.catalog.delivery_areas().await?,
    };

    Ok(StdResponse {
        data: Some(areas),
        message: Some("Get delivery areas successfully"),
    })
}
