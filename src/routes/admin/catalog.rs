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
    auth::AdminSession,
    domain::{
        DeliveryArea, Product,
        catalog::{DeliveryAreaInput, ProductInput},
    },
};

pub fn routes_with_openapi() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(utoipa_axum::routes!(list_all_products, create_product))
        .routes(utoipa_axum::routes!(update_product, delete_product))
        .routes(utoipa_axum::routes!(create_area))
        .routes(utoipa_axum::routes!(update_area, delete_area))
}

/// List every product, including unavailable ones.
#[utoipa::path(
    get,
    path = "/products",
    tags = ["Admin"],
    security(("bearerAuth" = [])),
    responses(
        (status = 200, description = "List products", body = StdResponse<Vec<Product>, String>)
    )
)]
async fn list_all_products(
    _session: AdminSession,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    let products = state.catalog.all_products().await?;

    Ok(StdResponse {
        data: Some(products),
        message: Some("Get products successfully"),
    })
}

#[utoipa::path(
    post,
    path = "/products",
    tags = ["Admin"],
    security(("bearerAuth" = [])),
    request_body = ProductInput,
    responses(
        (status = 201, description = "Product created", body = StdResponse<Product, String>),
        (status = 400, description = "Invalid product", body = StdResponse<String, String>)
    )
)]
async fn create_product(
    _session: AdminSession,
    State(state): State<AppState>,
    Json(input): Json<ProductInput>,
) -> Result<impl IntoResponse, AppError> {
    let product = state.catalog.create_product(input).await?;

    Ok(Created(StdResponse {
        data: Some(product),
        message: Some("Product created successfully"),
    }))
}

#[utoipa::path(
    put,
    path = "/products/{id}",
    tags = ["Admin"],
    security(("bearerAuth" = [])),
    params(
        ("id" = String, Path, description = "Product ID")
    ),
    request_body = ProductInput,
    responses(
        (status = 200, description = "Product updated", body = StdResponse<Product, String>),
        (status = 404, description = "Product not found", body = StdResponse<String, String>)
    )
)]
async fn update_product(
    _session: AdminSession,
    Path(id): Path<String>,
    State(state): State<AppState>,
    Json(input): Json<ProductInput>,
) -> Result<impl IntoResponse, AppError> {
    let product = state.catalog.update_product(&id, input).await?;

    Ok(StdResponse {
        data: Some(product),
        message: Some("Product updated successfully"),
    })
}

#[utoipa::path(
    delete,
    path = "/products/{id}",
    tags = ["Admin"],
    security(("bearerAuth" = [])),
    params(
        ("id" = String, Path, description = "Product ID")
    ),
    responses(
        (status = 200, description = "Product deleted", body = StdResponse<String, String>),
        (status = 404, description = "Product not found", body = StdResponse<String, String>)
    )
)]
async fn delete_product(
    _session: AdminSession,
    Path(id): Path<String>,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    state.catalog.delete_product(&id).await?;

    Ok(StdResponse::<(), &str> {
        data: None,
        message: Some("Product deleted successfully"),
    })
}

#[utoipa::path(
    post,
    path = "/delivery-areas",
    tags = ["Admin"],
    security(("bearerAuth" = [])),
    request_body = DeliveryAreaInput,
    responses(
        (status = 201, description = "Delivery area created", body = StdResponse<DeliveryArea, String>),
        (status = 400, description = "Invalid delivery area", body = StdResponse<String, String>)
    )
)]
async fn create_area(
    _session: AdminSession,
    State(state): State<AppState>,
    Json(input): Json<DeliveryAreaInput>,
) -> Result<impl IntoResponse, AppError> {
    let area = state.catalog.create_area(input).await?;

    Ok(Created(StdResponse {
        data: Some(area),
        message: Some("Delivery area created successfully"),
    }))
}

#[utoipa::path(
    put,
    path = "/delivery-areas/{id}",
    tags = ["Admin"],
    security(("bearerAuth" = [])),
    params(
        ("id" = Uuid, Path, description = "Delivery area ID")
    ),
    request_body = DeliveryAreaInput,
    responses(
        (status = 200, description = "Delivery area updated", body = StdResponse<DeliveryArea, String>),
        (status = 404, description = "Delivery area not found", body = StdResponse<String, String>)
    )
)]
async fn update_area(
    _session: AdminSession,
    Path(id): Path<Uuid>,
    State(state): State<AppState>,
    Json(input): Json<DeliveryAreaInput>,
) -> Result<impl IntoResponse, AppError> {
    let area = state.catalog.update_area(id, input).await?;

    Ok(StdResponse {
        data: Some(area),
        message: Some("Delivery area updated successfully"),
    })
}

#[utoipa::path(
    delete,
    path = "/delivery-areas/{id}",
    tags = ["Admin"],
    security(("bearerAuth" = [])),
    params(
        ("id" = Uuid, Path, description = "Delivery area ID")
    ),
    responses(
        (status = 200, description = "Delivery area deleted", body = StdResponse<String, String>),
        (status = 404, description = "Delivery area not found", body = StdResponse<String, String>)
    )
)]
async fn delete_area(
    _session: AdminSession,
    Path(id): Path<Uuid>,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    state.catalog.delete_area(id).await?;

    Ok(StdResponse::<(), &str> {
        data: None,
        message: Some("Delivery area deleted successfully"),
    })
}
