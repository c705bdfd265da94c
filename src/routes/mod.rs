pub mod admin;
pub mod catalog;
pub mod orders;
pub mod payments;

use axum::Router;
use tower_http::trace::TraceLayer;
use utoipa_axum::router::OpenApiRouter;

use crate::{app_state::AppState, swagger};

pub fn routes_with_openapi() -> OpenApiRouter<AppState> {
    catalog::routes_with_openapi()
        .merge(orders::routes_with_openapi())
        .merge(payments::routes_with_openapi())
        .merge(admin::routes_with_openapi())
}

/// The complete HTTP application: API routes, Swagger UI and request tracing.
pub fn app(state: AppState) -> Router {
    let (router, openapi) = routes_with_openapi().split_for_parts();

    Router::new()
        .merge(router.with_state(state))
        .merge(swagger::create_swagger_ui(openapi))
        .layer(TraceLayer::new_for_http())
}
