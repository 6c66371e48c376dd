use anyhow::Context;
use axum::{
    Extension,
    extract::State,
    response::IntoResponse,
};
use utoipa_axum::router::OpenApiRouter;
use uuid::Uuid;

use crate::{
    app_error::{AppError, StdResponse},
    app_state::AppState,
    domain::addresses::{self, Address, AddressInput},
    extract::{AppJson, AppPath},
    middleware,
    store,
};

/// Defines the address book routes (authorization required).
pub fn routes_with_openapi(state: &AppState) -> OpenApiRouter<AppState> {
    OpenApiRouter::new().nest(
        "/addresses",
        OpenApiRouter::new()
            .routes(utoipa_axum::routes!(get_addresses, create_address))
            .routes(utoipa_axum::routes!(update_address, delete_address))
            .routes(utoipa_axum::routes!(set_default_address))
            .route_layer(axum::middleware::from_fn_with_state(
                state.clone(),
                middleware::authorization,
            )),
    )
}

/// Fetch the authenticated user's addresses.
#[utoipa::path(
    get,
    path = "/",
    tags = ["Addresses"],
    security(("bearerAuth" = [])),
    responses(
        (status = 200, description = "List my addresses", body = StdResponse<Vec<Address>, String>)
    )
)]
async fn get_addresses(
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
        data: Some(user.addresses),
        message: Some("Get addresses successfully"),
    })
}

/// Add an address. The first address, or one flagged `isDefault`, becomes the default.
#[utoipa::path(
    post,
    path = "/",
    tags = ["Addresses"],
    security(("bearerAuth" = [])),
    request_body = AddressInput,
    responses(
        (status = 200, description = "Created address successfully", body = StdResponse<Address, String>),
        (status = 400, description = "Invalid address")
    )
)]
async fn create_address(
    State(state): State<AppState>,
    Extension(user_id): Extension<Uuid>,
    AppJson(body): AppJson<AddressInput>,
) -> Result<impl IntoResponse, AppError> {
    let conn = &mut state
        .db_pool
        .get()
        .await
        .context("Failed to obtain a DB connection pool")?;

    let mut user = store::load_user(conn, user_id).await?;
    let address = addresses::add_address(&mut user.addresses, body)?;
    store::save_addresses(conn, user_id, &user.addresses).await?;

    Ok(StdResponse {
        data: Some(address),
        message: Some("Created address successfully"),
    })
}

/// Overwrite an address.
#[utoipa::path(
    put,
    path = "/{id}",
    tags = ["Addresses"],
    security(("bearerAuth" = [])),
    params(
        ("id" = Uuid, Path, description = "Address ID to update")
    ),
    request_body = AddressInput,
    responses(
        (status = 200, description = "Updated address successfully", body = StdResponse<Address, String>),
        (status = 400, description = "Invalid address"),
        (status = 404, description = "Address not found")
    )
)]
async fn update_address(
    AppPath(id): AppPath<Uuid>,
    State(state): State<AppState>,
    Extension(user_id): Extension<Uuid>,
    AppJson(body): AppJson<AddressInput>,
) -> Result<impl IntoResponse, AppError> {
    let conn = &mut state
        .db_pool
        .get()
        .await
        .context("Failed to obtain a DB connection pool")?;

    let mut user = store::load_user(conn, user_id).await?;
    let address = addresses::update_address(&mut user.addresses, id, body)?;
    store::save_addresses(conn, user_id, &user.addresses).await?;

    Ok(StdResponse {
        data: Some(address),
        message: Some("Updated address successfully"),
    })
}

/// Delete an address. Removing the default promotes the next address.
#[utoipa::path(
    delete,
    path = "/{id}",
    tags = ["Addresses"],
    security(("bearerAuth" = [])),
    params(
        ("id" = Uuid, Path, description = "Address ID to delete")
    ),
    responses(
        (status = 200, description = "Deleted address successfully", body = StdResponse<Address, String>),
        (status = 404, description = "Address not found")
    )
)]
async fn delete_address(
    AppPath(id): AppPath<Uuid>,
    State(state): State<AppState>,
    Extension(user_id): Extension<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let conn = &mut state
        .db_pool
        .get()
        .await
        .context("Failed to obtain a DB connection pool")?;

    let mut user = store::load_user(conn, user_id).await?;
    let removed = addresses::remove_address(&mut user.addresses, id)?;
    store::save_addresses(conn, user_id, &user.addresses).await?;

    Ok(StdResponse {
        data: Some(removed),
        message: Some("Deleted address successfully"),
    })
}

/// Make an address the default.
#[utoipa::path(
    patch,
    path = "/{id}/default",
    tags = ["Addresses"],
    security(("bearerAuth" = [])),
    params(
        ("id" = Uuid, Path, description = "Address ID to make default")
    ),
    responses(
        (status = 200, description = "Set default address successfully", body = StdResponse<Address, String>),
        (status = 404, description = "Address not found")
    )
)]
async fn set_default_address(
    AppPath(id): AppPath<Uuid>,
    State(state): State<AppState>,
    Extension(user_id): Extension<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let conn = &mut state
        .db_pool
        .get()
        .await
        .context("Failed to obtain a DB connection pool")?;

    let mut user = store::load_user(conn, user_id).await?;
    let address = addresses::set_default(&mut user.addresses, id)?;
    store::save_addresses(conn, user_id, &user.addresses).await?;

    Ok(StdResponse {
        data: Some(address),
        message: Some("Set default address successfully"),
    })
}
