//! Document rules applied to a user's embedded cart, addresses and orders.
//!
//! Everything here is pure: handlers load the user document, call into these
//! functions and save the result.

pub mod addresses;
pub mod cart;
pub mod orders;

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DomainError {
    #[error("{0}")]
    Validation(String),
    #[error("{0} not found")]
    NotFound(String),
}

impl DomainError {
    pub(crate) fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }
}

/// Rounds a money amount to 2 decimals.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
