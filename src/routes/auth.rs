use anyhow::Context;
use axum::{Extension, extract::State, response::IntoResponse};
use diesel::{
    SelectableHelper,
    result::{DatabaseErrorKind, Error as DieselError},
};
use diesel_async::RunQueryDsl;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use utoipa_axum::router::OpenApiRouter;
use uuid::Uuid;

use crate::{
    app_error::{AppError, StdResponse},
    app_state::AppState,
    auth,
    domain::{
        DomainError,
        cart::{CartItem, CartTotals},
    },
    extract::AppJson,
    middleware::{self, SessionToken},
    models::{CreateUserEntity, UserEntity},
    schema::users,
    store::{self, UserDocument, UserProfile},
};

/// Public register/login routes plus the token-protected logout and profile routes.
pub fn routes_with_openapi(state: &AppState) -> OpenApiRouter<AppState> {
    let protected = OpenApiRouter::new()
        .routes(utoipa_axum::routes!(logout))
        .routes(utoipa_axum::routes!(me))
        .route_layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::authorization,
        ));

    OpenApiRouter::new().nest(
        "/auth",
        OpenApiRouter::new()
            .routes(utoipa_axum::routes!(register))
            .routes(utoipa_axum::routes!(login))
            .merge(protected),
    )
}

#[derive(Deserialize, Serialize, ToSchema)]
pub struct RegisterReq {
    pub name: String,
    pub email: String,
    pub password: String,
}

#[derive(Deserialize, Serialize, ToSchema)]
pub struct LoginReq {
    pub email: String,
    pub password: String,
}

/// Returned by register and login. `cart` is the server-held cart, which
/// replaces whatever the client kept locally.
#[derive(Serialize, Deserialize, Debug, ToSchema)]
pub struct AuthRes {
    pub token: String,
    pub user: UserProfile,
    pub cart: Vec<CartItem>,
    pub totals: CartTotals,
}

impl AuthRes {
    fn new(token: String, user: &UserDocument) -> Self {
        Self {
            token,
            user: user.profile(),
            cart: user.cart.clone(),
            totals: CartTotals::compute(&user.cart),
        }
    }
}

/// Create an account and log it in.
#[utoipa::path(
    post,
    path = "/register",
    tags = ["Auth"],
    request_body = RegisterReq,
    responses(
        (status = 200, description = "Registered successfully", body = StdResponse<AuthRes, String>),
        (status = 400, description = "Invalid name, email or password"),
        (status = 409, description = "Email already registered")
    )
)]
async fn register(
    State(state): State<AppState>,
    AppJson(body): AppJson<RegisterReq>,
) -> Result<impl IntoResponse, AppError> {
    let name = body.name.trim().to_string();
    if name.is_empty() {
        return Err(DomainError::validation("Name is required").into());
    }
    let email = auth::normalize_email(&body.email)?;
    auth::validate_password(&body.password)?;
    let password_hash = auth::hash_password(&body.password)?;

    let conn = &mut state
        .db_pool
        .get()
        .await
        .context("Failed to obtain a DB connection pool")?;

    let user: UserEntity = diesel::insert_into(users::table)
        .values(CreateUserEntity {
            email,
            password_hash,
            name,
        })
        .returning(UserEntity::as_returning())
        .get_result(conn)
        .await
        .map_err(|err| match err {
            DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => {
                AppError::Conflict("An account with this email already exists".into())
            }
            other => AppError::Other(anyhow::Error::new(other).context("Failed to create user")),
        })?;
    let user = UserDocument::try_from(user)?;

    let token = auth::issue_session(conn, user.id, state.config.auth.token_ttl).await?;
    tracing::info!(user_id = %user.id, "Registered new user");

    Ok(StdResponse {
        data: Some(AuthRes::new(token, &user)),
        message: Some("Registered successfully"),
    })
}

/// Exchange email and password for a bearer token.
#[utoipa::path(
    post,
    path = "/login",
    tags = ["Auth"],
    request_body = LoginReq,
    responses(
        (status = 200, description = "Logged in successfully", body = StdResponse<AuthRes, String>),
        (status = 401, description = "Invalid credentials")
    )
)]
async fn login(
    State(state): State<AppState>,
    AppJson(body): AppJson<LoginReq>,
) -> Result<impl IntoResponse, AppError> {
    let invalid = || AppError::Unauthorized("Invalid credentials".into());
    let email = auth::normalize_email(&body.email).map_err(|_| invalid())?;

    let conn = &mut state
        .db_pool
        .get()
        .await
        .context("Failed to obtain a DB connection pool")?;

    let Some((user, password_hash)) = store::find_user_by_email(conn, &email).await? else {
        return Err(invalid());
    };
    if !auth::verify_password(&body.password, &password_hash) {
        tracing::info!(user_id = %user.id, "Rejected login with wrong password");
        return Err(invalid());
    }

    let token = auth::issue_session(conn, user.id, state.config.auth.token_ttl).await?;

    Ok(StdResponse {
        data: Some(AuthRes::new(token, &user)),
        message: Some("Logged in successfully"),
    })
}

/// Revoke the presented token.
#[utoipa::path(
    post,
    path = "/logout",
    tags = ["Auth"],
    security(("bearerAuth" = [])),
    responses(
        (status = 200, description = "Logged out successfully")
    )
)]
async fn logout(
    State(state): State<AppState>,
    Extension(SessionToken(token)): Extension<SessionToken>,
) -> Result<impl IntoResponse, AppError> {
    let conn = &mut state
        .db_pool
        .get()
        .await
        .context("Failed to obtain a DB connection pool")?;

    auth::revoke_session(conn, &token).await?;

    Ok(StdResponse::<(), _> {
        data: None,
        message: Some("Logged out successfully"),
    })
}

/// Profile of the authenticated user.
#[utoipa::path(
    get,
    path = "/me",
    tags = ["Auth"],
    security(("bearerAuth" = [])),
    responses(
        (status = 200, description = "Get profile successfully", body = StdResponse<UserProfile, String>)
    )
)]
async fn me(
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
        data: Some(user.profile()),
        message: Some("Get profile successfully"),
    })
}
