pub mod addresses;
pub mod auth;
pub mod cart;
pub mod orders;
pub mod products;

use anyhow::Result;
use axum::{Json, Router, routing};
use serde_json::{Value, json};
use utoipa_axum::router::OpenApiRouter;

use crate::{app_state::AppState, swagger};

/// Every resource router merged, before the OpenAPI document is split off.
pub fn routes_with_openapi(state: &AppState) -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .merge(auth::routes_with_openapi(state))
        .merge(products::routes_with_openapi())
        .merge(cart::routes_with_openapi(state))
        .merge(orders::routes_with_openapi(state))
        .merge(addresses::routes_with_openapi(state))
}

/// The complete application: API routes, health check and Swagger UI.
pub fn app(state: AppState) -> Result<Router> {
    let (router, mut openapi) = routes_with_openapi(&state).split_for_parts();
    openapi.info = utoipa::openapi::InfoBuilder::new()
        .title("Storefront API")
        .version(env!("CARGO_PKG_VERSION"))
        .build();
    let swagger_ui = swagger::create_swagger_ui(openapi)?;

    Ok(router
        .route("/health", routing::get(health))
        .with_state(state)
        .merge(swagger_ui))
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}
