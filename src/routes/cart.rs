use anyhow::Context;
use axum::{Extension, extract::State, response::IntoResponse};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use utoipa_axum::router::OpenApiRouter;
use uuid::Uuid;

use crate::{
    app_error::{AppError, StdResponse},
    app_state::AppState,
    domain::cart::{self, CartItem, CartTotals},
    extract::AppJson,
    middleware,
    store,
};

/// Defines all cart routes. Every route requires a bearer token.
pub fn routes_with_openapi(state: &AppState) -> OpenApiRouter<AppState> {
    OpenApiRouter::new().nest(
        "/cart",
        OpenApiRouter::new()
            .routes(utoipa_axum::routes!(get_cart, replace_cart))
            .routes(utoipa_axum::routes!(add_to_cart))
            .routes(utoipa_axum::routes!(update_cart_item))
            .routes(utoipa_axum::routes!(remove_from_cart))
            .routes(utoipa_axum::routes!(clear_cart))
            .route_layer(axum::middleware::from_fn_with_state(
                state.clone(),
                middleware::authorization,
            )),
    )
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, ToSchema)]
pub struct CartRes {
    pub items: Vec<CartItem>,
    pub totals: CartTotals,
}

impl CartRes {
    pub fn new(items: Vec<CartItem>) -> Self {
        let totals = CartTotals::compute(&items);
        Self { items, totals }
    }
}

#[derive(Deserialize, Serialize, ToSchema)]
pub struct ReplaceCartReq {
    pub items: Vec<CartItem>,
}

#[derive(Deserialize, Serialize, ToSchema)]
pub struct UpdateCartItemReq {
    pub name: String,
    pub quantity: u32,
}

#[derive(Deserialize, Serialize, ToSchema)]
pub struct RemoveCartItemReq {
    pub name: String,
}

/// Fetch the authenticated user's cart with its totals.
#[utoipa::path(
    get,
    path = "/",
    tags = ["Cart"],
    security(("bearerAuth" = [])),
    responses(
        (status = 200, description = "Get cart successfully", body = StdResponse<CartRes, String>)
    )
)]
async fn get_cart(
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
        data: Some(CartRes::new(user.cart)),
        message: Some("Get cart successfully"),
    })
}

/// Replace the whole cart. Lines sharing a name are merged.
#[utoipa::path(
    put,
    path = "/",
    tags = ["Cart"],
    security(("bearerAuth" = [])),
    request_body = ReplaceCartReq,
    responses(
        (status = 200, description = "Replaced cart successfully", body = StdResponse<CartRes, String>),
        (status = 400, description = "Invalid cart item")
    )
)]
async fn replace_cart(
    State(state): State<AppState>,
    Extension(user_id): Extension<Uuid>,
    AppJson(body): AppJson<ReplaceCartReq>,
) -> Result<impl IntoResponse, AppError> {
    let items = cart::replace(body.items)?;

    let conn = &mut state
        .db_pool
        .get()
        .await
        .context("Failed to obtain a DB connection pool")?;

    store::save_cart(conn, user_id, &items).await?;

    Ok(StdResponse {
        data: Some(CartRes::new(items)),
        message: Some("Replaced cart successfully"),
    })
}

/// Add an item, or increase its quantity when the name is already in the cart.
#[utoipa::path(
    post,
    path = "/add",
    tags = ["Cart"],
    security(("bearerAuth" = [])),
    request_body = CartItem,
    responses(
        (status = 200, description = "Added item successfully", body = StdResponse<CartRes, String>),
        (status = 400, description = "Invalid cart item")
    )
)]
async fn add_to_cart(
    State(state): State<AppState>,
    Extension(user_id): Extension<Uuid>,
    AppJson(body): AppJson<CartItem>,
) -> Result<impl IntoResponse, AppError> {
    let conn = &mut state
        .db_pool
        .get()
        .await
        .context("Failed to obtain a DB connection pool")?;

    let mut user = store::load_user(conn, user_id).await?;
    cart::add_item(&mut user.cart, body)?;
    store::save_cart(conn, user_id, &user.cart).await?;

    Ok(StdResponse {
        data: Some(CartRes::new(user.cart)),
        message: Some("Added item successfully"),
    })
}

/// Set the quantity of a cart line.
#[utoipa::path(
    put,
    path = "/update",
    tags = ["Cart"],
    security(("bearerAuth" = [])),
    request_body = UpdateCartItemReq,
    responses(
        (status = 200, description = "Updated item successfully", body = StdResponse<CartRes, String>),
        (status = 400, description = "Quantity below 1"),
        (status = 404, description = "Item not in cart")
    )
)]
async fn update_cart_item(
    State(state): State<AppState>,
    Extension(user_id): Extension<Uuid>,
    AppJson(body): AppJson<UpdateCartItemReq>,
) -> Result<impl IntoResponse, AppError> {
    let conn = &mut state
        .db_pool
        .get()
        .await
        .context("Failed to obtain a DB connection pool")?;

    let mut user = store::load_user(conn, user_id).await?;
    cart::update_quantity(&mut user.cart, &body.name, body.quantity)?;
    store::save_cart(conn, user_id, &user.cart).await?;

    Ok(StdResponse {
        data: Some(CartRes::new(user.cart)),
        message: Some("Updated item successfully"),
    })
}

/// Remove a line from the cart.
#[utoipa::path(
    delete,
    path = "/remove",
    tags = ["Cart"],
    security(("bearerAuth" = [])),
    request_body = RemoveCartItemReq,
    responses(
        (status = 200, description = "Removed item successfully", body = StdResponse<CartRes, String>),
        (status = 404, description = "Item not in cart")
    )
)]
async fn remove_from_cart(
    State(state): State<AppState>,
    Extension(user_id): Extension<Uuid>,
    AppJson(body): AppJson<RemoveCartItemReq>,
) -> Result<impl IntoResponse, AppError> {
    let conn = &mut state
        .db_pool
        .get()
        .await
        .context("Failed to obtain a DB connection pool")?;

    let mut user = store::load_user(conn, user_id).await?;
    cart::remove_item(&mut user.cart, &body.name)?;
    store::save_cart(conn, user_id, &user.cart).await?;

    Ok(StdResponse {
        data: Some(CartRes::new(user.cart)),
        message: Some("Removed item successfully"),
    })
}

/// Empty the cart.
#[utoipa::path(
    delete,
    path = "/clear",
    tags = ["Cart"],
    security(("bearerAuth" = [])),
    responses(
        (status = 200, description = "Cleared cart successfully", body = StdResponse<CartRes, String>)
    )
)]
async fn clear_cart(
    State(state): State<AppState>,
    Extension(user_id): Extension<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let conn = &mut state
        .db_pool
        .get()
        .await
        .context("Failed to obtain a DB connection pool")?;

    store::save_cart(conn, user_id, &[]).await?;

    Ok(StdResponse {
        data: Some(CartRes::new(Vec::new())),
        message: Some("Cleared cart successfully"),
    })
}
