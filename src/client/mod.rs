//! Client-side cart and session handling.
//!
//! [`CartSession`] keeps the cart in memory, mirrors it to a [`LocalStore`]
//! file and talks to the storefront API through [`ApiClient`] once the user
//! is logged in. Guest carts live only locally; on login the server cart
//! replaces the local one. Address book and order history calls need a
//! logged-in user.

mod api;
mod session;
mod storage;

pub use api::ApiClient;
pub use session::CartSession;
pub use storage::{LocalState, LocalStore};

use thiserror::Error;

use crate::domain::DomainError;

#[derive(Debug, Error)]
pub enum ClientError {
    /// The server rejected the token with 401 or 403. The session has been cleared.
    #[error("Session expired, please log in again")]
    Unauthorized,

    /// Login was refused with 401.
    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("Not logged in")]
    NotLoggedIn,

    #[error("Request failed with status {status}: {message}")]
    Api { status: u16, message: String },

    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Local storage error: {0}")]
    Storage(#[from] std::io::Error),

    #[error("Malformed local state: {0}")]
    Json(#[from] serde_json::Error),
}
