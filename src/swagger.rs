use utoipa::openapi::{
    InfoBuilder, OpenApi,
    security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
};
use utoipa_swagger_ui::SwaggerUi;

pub const OPENAPI_URL: &str = "/api-docs/openapi.json";

/// Titles the generated document, registers the admin auth scheme and mounts Swagger UI.
pub fn create_swagger_ui(mut openapi: OpenApi) -> SwaggerUi {
    openapi.info = InfoBuilder::new()
        .title("Seafood OrderService API")
        .version(env!("CARGO_PKG_VERSION"))
        .build();
    openapi
        .components
        .get_or_insert_with(Default::default)
        .add_security_scheme(
            "bearerAuth",
            SecurityScheme::Http(HttpBuilder::new().scheme(HttpAuthScheme::Bearer).build()),
        );

    SwaggerUi::new("/swagger-ui").url(OPENAPI_URL, openapi)
}
