//! Loading and saving user documents.
//!
//! Each save overwrites the embedded lists wholesale, so concurrent writers on
//! the same user are last-write-wins.

use anyhow::Context;
use diesel::{ExpressionMethods, OptionalExtension, QueryDsl, SelectableHelper};
use diesel_async::{AsyncPgConnection, RunQueryDsl};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use serde_json::Value;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    app_error::AppError,
    domain::{addresses::Address, cart::CartItem, orders::Order},
    models::UserEntity,
    schema::users,
};

#[derive(Debug, Clone)]
pub struct UserDocument {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub cart: Vec<CartItem>,
    /// Newest first.
    pub orders: Vec<Order>,
    pub addresses: Vec<Address>,
}

/// Public view of a user account.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, ToSchema)]
pub struct UserProfile {
    pub id: Uuid,
    pub email: String,
    pub name: String,
}

impl UserDocument {
    pub fn profile(&self) -> UserProfile {
        UserProfile {
            id: self.id,
            email: self.email.clone(),
            name: self.name.clone(),
        }
    }
}

impl TryFrom<UserEntity> for UserDocument {
    type Error = anyhow::Error;

    fn try_from(entity: UserEntity) -> Result<Self, Self::Error> {
        Ok(Self {
            id: entity.id,
            email: entity.email,
            name: entity.name,
            cart: decode(entity.cart).context("Malformed cart in user document")?,
            orders: decode(entity.orders).context("Malformed orders in user document")?,
            addresses: decode(entity.addresses)
                .context("Malformed addresses in user document")?,
        })
    }
}

fn decode<T: DeserializeOwned>(value: Value) -> serde_json::Result<Vec<T>> {
    match value {
        Value::Null => Ok(Vec::new()),
        value => serde_json::from_value(value),
    }
}

fn encode<T: Serialize>(items: &[T]) -> anyhow::Result<Value> {
    serde_json::to_value(items).context("Failed to encode user document field")
}

pub async fn load_user(conn: &mut AsyncPgConnection, id: Uuid) -> Result<UserDocument, AppError> {
    let user: Option<UserEntity> = users::table
        .find(id)
        .select(UserEntity::as_select())
        .get_result(conn)
        .await
        .optional()
        .context("Failed to load user")?;

    match user {
        Some(user) => Ok(UserDocument::try_from(user)?),
        None => Err(AppError::NotFound("User not found".into())),
    }
}

pub async fn find_user_by_email(
    conn: &mut AsyncPgConnection,
    email: &str,
) -> Result<Option<(UserDocument, String)>, AppError> {
    let user: Option<UserEntity> = users::table
        .filter(users::email.eq(email))
        .select(UserEntity::as_select())
        .get_result(conn)
        .await
        .optional()
        .context("Failed to look up user by email")?;

    match user {
        Some(user) => {
            let password_hash = user.password_hash.clone();
            Ok(Some((UserDocument::try_from(user)?, password_hash)))
        }
        None => Ok(None),
    }
}

pub async fn save_cart(
    conn: &mut AsyncPgConnection,
    id: Uuid,
    cart: &[CartItem],
) -> Result<(), AppError> {
    diesel::update(users::table.find(id))
        .set((
            users::cart.eq(encode(cart)?),
            users::updated_at.eq(diesel::dsl::now),
        ))
        .execute(conn)
        .await
        .context("Failed to save cart")?;
    Ok(())
}

pub async fn save_addresses(
    conn: &mut AsyncPgConnection,
    id: Uuid,
    addresses: &[Address],
) -> Result<(), AppError> {
    diesel::update(users::table.find(id))
        .set((
            users::addresses.eq(encode(addresses)?),
            users::updated_at.eq(diesel::dsl::now),
        ))
        .execute(conn)
        .await
        .context("Failed to save addresses")?;
    Ok(())
}

/// Writes the new order list and the emptied cart in one statement.
pub async fn save_checkout(
    conn: &mut AsyncPgConnection,
    id: Uuid,
    cart: &[CartItem],
    orders: &[Order],
) -> Result<(), AppError> {
    diesel::update(users::table.find(id))
        .set((
            users::cart.eq(encode(cart)?),
            users::orders.eq(encode(orders)?),
            users::updated_at.eq(diesel::dsl::now),
        ))
        .execute(conn)
        .await
        .context("Failed to save order")?;
    Ok(())
}
