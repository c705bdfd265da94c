//! Back-office routes. Every handler takes an [`AdminSession`](crate::auth::AdminSession).

pub mod catalog;
pub mod orders;
pub mod reports;

use utoipa_axum::router::OpenApiRouter;

use crate::app_state::AppState;

pub fn routes_with_openapi() -> OpenApiRouter<AppState> {
    OpenApiRouter::new().nest(
        "/admin",
        orders::routes_with_openapi()
            .merge(catalog::routes_with_openapi())
            .merge(reports::routes_with_openapi()),
    )
}
