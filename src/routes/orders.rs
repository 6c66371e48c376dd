use anyhow::Context;
use axum::{
    Extension,
    extract::State,
    response::IntoResponse,
};
use chrono::Utc;
use utoipa_axum::router::OpenApiRouter;
use uuid::Uuid;

use crate::{
    app_error::{AppError, StdResponse},
    app_state::AppState,
    domain::orders::{self, CheckoutRequest, Order},
    extract::{AppJson, AppPath},
    middleware,
    store,
};

/// Defines the order history and checkout routes (authorization required).
pub fn routes_with_openapi(state: &AppState) -> OpenApiRouter<AppState> {
    OpenApiRouter::new().nest(
        "/orders",
        OpenApiRouter::new()
            .routes(utoipa_axum::routes!(get_orders, create_order))
            .routes(utoipa_axum::routes!(get_order))
            .route_layer(axum::middleware::from_fn_with_state(
                state.clone(),
                middleware::authorization,
            )),
    )
}

/// Fetch the authenticated user's orders, newest first.
#[utoipa::path(
    get,
    path = "/",
    tags = ["Orders"],
    security(("bearerAuth" = [])),
    responses(
        (status = 200, description = "List my orders", body = StdResponse<Vec<Order>, String>)
    )
)]
async fn get_orders(
    State(state): State<AppState>,
    Extension(user_id): Extension<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let conn = &mut state
        .db_pool
        .get()
        .await
        .context("Failed to obtain a DB connection pool")?;

    let user = store::load_user(conn, user_id).await?;

    Ok(StdResponse {
        data: Some(user.orders),
        message: Some("Get my orders successfully"),
    })
}

/// Fetch one order by its order id.
#[utoipa::path(
    get,
    path = "/{order_id}",
    tags = ["Orders"],
    security(("bearerAuth" = [])),
    params(
        ("order_id" = String, Path, description = "Order ID to fetch, e.g. ORD-20260314-1A2B3C4D")
    ),
    responses(
        (status = 200, description = "Get order successfully", body = StdResponse<Order, String>),
        (status = 404, description = "Order not found")
    )
)]
async fn get_order(
    AppPath(order_id): AppPath<String>,
    State(state): State<AppState>,
    Extension(user_id): Extension<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let conn = &mut state
        .db_pool
        .get()
        .await
        .context("Failed to obtain a DB connection pool")?;

    let user = store::load_user(conn, user_id).await?;
    let order = user
        .orders
        .into_iter()
        .find(|order| order.order_id == order_id)
        .ok_or_else(|| AppError::NotFound("Order not found".into()))?;

    Ok(StdResponse {
        data: Some(order),
        message: Some("Get order successfully"),
    })
}

/// Check out the current cart.
///
/// Snapshots the cart and the delivery address into a new order and empties
/// the cart in the same save.
#[utoipa::path(
    post,
    path = "/",
    tags = ["Orders"],
    security(("bearerAuth" = [])),
    request_body = CheckoutRequest,
    responses(
        (status = 200, description = "Created order successfully", body = StdResponse<Order, String>),
        (status = 400, description = "Empty cart, missing address or missing payment id"),
        (status = 404, description = "Address not found")
    )
)]
async fn create_order(
    State(state): State<AppState>,
    Extension(user_id): Extension<Uuid>,
    AppJson(body): AppJson<CheckoutRequest>,
) -> Result<impl IntoResponse, AppError> {
    let conn = &mut state
        .db_pool
        .get()
        .await
        .context("Failed to obtain a DB connection pool")?;

    let mut user = store::load_user(conn, user_id).await?;
    let order = orders::place_order(&mut user.cart, &user.addresses, body, Utc::now())?;

    user.orders.insert(0, order.clone());
    store::save_checkout(conn, user_id, &user.cart, &user.orders).await?;

    tracing::info!(
        user_id = %user_id,
        order_id = %order.order_id,
        total = order.total,
        "Order placed"
    );

    Ok(StdResponse {
        data: Some(order),
        message: Some("Create order successfully"),
    })
}
