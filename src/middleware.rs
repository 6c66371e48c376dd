use anyhow::Context;
use axum::{
    extract::{Request, State},
    http::{HeaderMap, header},
    middleware::Next,
    response::Response,
};
use diesel::{ExpressionMethods, OptionalExtension, QueryDsl, SelectableHelper};
use diesel_async::RunQueryDsl;

use crate::{app_error::AppError, app_state::AppState, models::SessionEntity, schema::sessions};

/// The raw bearer token of the current request, kept so it can be revoked.
#[derive(Clone, Debug)]
pub struct SessionToken(pub String);

/// Extracts the token from an `Authorization: Bearer <token>` header.
pub fn bearer_token(headers: &HeaderMap) -> Result<String, AppError> {
    let value = headers
        .get(header::AUTHORIZATION)
        .ok_or_else(|| AppError::Unauthorized("Missing authorization header".into()))?
        .to_str()
        .map_err(|_| AppError::Unauthorized("Malformed authorization header".into()))?;

    match value.split_once(' ') {
        Some((scheme, token)) if scheme.eq_ignore_ascii_case("bearer") && !token.trim().is_empty() => {
            Ok(token.trim().to_string())
        }
        _ => Err(AppError::Unauthorized("Malformed authorization header".into())),
    }
}

/// Resolves the bearer token to a user and exposes the id as `Extension<Uuid>`.
///
/// A missing header is a 401, an unknown or expired token a 403.
pub async fn authorization(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = bearer_token(req.headers())?;

    let session: Option<SessionEntity> = {
        let conn = &mut state
            .db_pool
            .get()
            .await
            .context("Failed to obtain a DB connection pool")?;

        sessions::table
            .find(&token)
            .filter(sessions::expires_at.gt(diesel::dsl::now))
            .select(SessionEntity::as_select())
            .get_result(conn)
            .await
            .optional()
            .context("Failed to look up session")?
    };

    let Some(session) = session else {
        tracing::debug!("Rejected unknown or expired token");
        return Err(AppError::ForbiddenResource("Invalid or expired token".into()));
    };

    req.extensions_mut().insert(session.user_id);
    req.extensions_mut().insert(SessionToken(token));

    Ok(next.run(req).await)
}

#[cfg(test)]
mod tests {
    use axum::http::HeaderValue;

    use super::*;

    fn headers(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn test_bearer_token() {
        assert_eq!(bearer_token(&headers("Bearer abc123")).unwrap(), "abc123");
        assert_eq!(bearer_token(&headers("bearer  abc123 ")).unwrap(), "abc123");
    }

    #[test]
    fn test_bearer_token_rejections() {
        assert!(matches!(
            bearer_token(&HeaderMap::new()),
            Err(AppError::Unauthorized(_))
        ));
        for bad in ["abc123", "Basic dXNlcjpwYXNz", "Bearer ", "Bearer"] {
            assert!(
                matches!(bearer_token(&headers(bad)), Err(AppError::Unauthorized(_))),
                "{bad} should be rejected"
            );
        }
    }
}
