//! Password hashing, credential validation and bearer token issuance.

use anyhow::Context;
use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use chrono::{DateTime, Duration, Utc};
use diesel::{ExpressionMethods, QueryDsl};
use diesel_async::{AsyncPgConnection, RunQueryDsl};
use rand::RngCore;
use uuid::Uuid;

use crate::{
    app_error::AppError, domain::DomainError, models::CreateSessionEntity, schema::sessions,
};

pub const MIN_PASSWORD_LENGTH: usize = 6;
const TOKEN_BYTES: usize = 32;

/// Lower-cases the email and checks it looks like `local@domain.tld`.
pub fn normalize_email(email: &str) -> Result<String, DomainError> {
    let email = email.trim().to_lowercase();

    let valid = match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.contains('@')
                && domain
                    .split_once('.')
                    .is_some_and(|(host, tld)| !host.is_empty() && !tld.is_empty())
                && !email.contains(char::is_whitespace)
        }
        None => false,
    };

    if valid {
        Ok(email)
    } else {
        Err(DomainError::validation("Invalid email address"))
    }
}

pub fn validate_password(password: &str) -> Result<(), DomainError> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(DomainError::validation(format!(
            "Password must be at least {MIN_PASSWORD_LENGTH} characters"
        )));
    }
    Ok(())
}

pub fn hash_password(password: &str) -> anyhow::Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|err| anyhow::anyhow!("Failed to hash password: {err}"))
}

pub fn verify_password(password: &str, hash: &str) -> bool {
    PasswordHash::new(hash)
        .and_then(|parsed| Argon2::default().verify_password(password.as_bytes(), &parsed))
        .is_ok()
}

pub fn generate_token() -> String {
    let mut bytes = [0u8; TOKEN_BYTES];
    rand::rng().fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

/// When a session issued at `now` stops being accepted.
pub fn session_expiry(now: DateTime<Utc>, ttl: Duration) -> anyhow::Result<DateTime<Utc>> {
    now.checked_add_signed(ttl)
        .ok_or_else(|| anyhow::anyhow!("Session lifetime of {ttl} is out of range"))
}

/// Stores a fresh session for `user_id` and returns its token.
pub async fn issue_session(
    conn: &mut AsyncPgConnection,
    user_id: Uuid,
    ttl: Duration,
) -> Result<String, AppError> {
    let token = generate_token();
    let expires_at = session_expiry(Utc::now(), ttl)?;

    diesel::insert_into(sessions::table)
        .values(CreateSessionEntity {
            token: token.clone(),
            user_id,
            expires_at,
        })
        .execute(conn)
        .await
        .context("Failed to create session")?;

    Ok(token)
}

pub async fn revoke_session(conn: &mut AsyncPgConnection, token: &str) -> Result<(), AppError> {
    diesel::delete(sessions::table.filter(sessions::token.eq(token)))
        .execute(conn)
        .await
        .context("Failed to delete session")?;
    Ok(())
}
