use anyhow::Context;
use axum::{
    extract::State,
    response::IntoResponse,
};
use diesel::{
    BoolExpressionMethods, ExpressionMethods, OptionalExtension, PgTextExpressionMethods,
    QueryDsl, SelectableHelper,
    dsl::sql,
    pg::Pg,
    sql_types::{Bool, Text},
};
use diesel_async::RunQueryDsl;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use utoipa_axum::router::OpenApiRouter;
use uuid::Uuid;

use crate::{
    app_error::{AppError, StdResponse},
    app_state::AppState,
    extract::{AppPath, AppQuery},
    models::ProductEntity,
    schema::products,
};

pub fn routes_with_openapi() -> OpenApiRouter<AppState> {
    OpenApiRouter::new().nest(
        "/products",
        OpenApiRouter::new()
            .routes(utoipa_axum::routes!(get_products))
            .routes(utoipa_axum::routes!(get_product)),
    )
}

#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ProductCategory {
    Ayurvedic,
    Generic,
    General,
    Prescription,
}

impl ProductCategory {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Ayurvedic => "ayurvedic",
            Self::Generic => "generic",
            Self::General => "general",
            Self::Prescription => "prescription",
        }
    }
}

#[derive(Deserialize, Serialize, Debug, Default, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ProductQuery {
    pub category: Option<ProductCategory>,
    /// Case-insensitive name match, or an exact keyword.
    pub search: Option<String>,
}

/// Escapes `LIKE` wildcards so the term is matched literally.
fn like_pattern(term: &str) -> String {
    let escaped = term
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{escaped}%")
}

/// Active products matching the category and search filters.
///
/// The search term matches names as a substring and keywords exactly, both
/// ignoring case.
fn filter_products(query: &ProductQuery) -> products::BoxedQuery<'static, Pg> {
    let mut statement = products::table
        .filter(products::is_active.eq(true))
        .into_boxed();

    if let Some(category) = query.category {
        statement = statement.filter(products::category.eq(category.as_str()));
    }

    if let Some(term) = query.search.as_deref().map(str::trim).filter(|t| !t.is_empty()) {
        let keyword_match = sql::<Bool>(
            "EXISTS (SELECT 1 FROM unnest(products.keywords) AS keyword WHERE lower(keyword) = ",
        )
        .bind::<Text, _>(term.to_lowercase())
        .sql(")");

        statement = statement.filter(products::name.ilike(like_pattern(term)).or(keyword_match));
    }

    statement
}

/// List active products.
#[utoipa::path(
    get,
    path = "/",
    tags = ["Products"],
    params(ProductQuery),
    responses(
        (status = 200, description = "List products", body = StdResponse<Vec<ProductEntity>, String>)
    )
)]
async fn get_products(
    State(state): State<AppState>,
    AppQuery(query): AppQuery<ProductQuery>,
) -> Result<impl IntoResponse, AppError> {
    let conn = &mut state
        .db_pool
        .get()
        .await
        .context("Failed to obtain a DB connection pool")?;

    let products: Vec<ProductEntity> = filter_products(&query)
        .select(ProductEntity::as_select())
        .order_by(products::name.asc())
        .get_results(conn)
        .await
        .context("Failed to get products")?;

    Ok(StdResponse {
        data: Some(products),
        message: Some("Get products successfully"),
    })
}

/// Fetch a single active product.
#[utoipa::path(
    get,
    path = "/{id}",
    tags = ["Products"],
    params(
        ("id" = Uuid, Path, description = "Product ID to fetch")
    ),
    responses(
        (status = 200, description = "Get product successfully", body = StdResponse<ProductEntity, String>),
        (status = 404, description = "Product not found")
    )
)]
async fn get_product(
    AppPath(id): AppPath<Uuid>,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    let conn = &mut state
        .db_pool
        .get()
        .await
        .context("Failed to obtain a DB connection pool")?;

    let product: Option<ProductEntity> = products::table
        .find(id)
        .filter(products::is_active.eq(true))
        .select(ProductEntity::as_select())
        .get_result(conn)
        .await
        .optional()
        .context("Failed to get product")?;

    match product {
        Some(product) => Ok(StdResponse {
            data: Some(product),
            message: Some("Get product successfully"),
        }),
        None => Err(AppError::NotFound("Product not found".into())),
    }
}
