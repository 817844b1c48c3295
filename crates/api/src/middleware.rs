use std::sync::Arc;

use axum::{
    async_trait,
    extract::{FromRequestParts, State},
    http::{HeaderMap, request::Parts},
    middleware::Next,
    response::Response,
};
use chrono::Utc;

use skillsgarden_auth::{JwtValidator, Principal};

use crate::app::errors::{ApiError, ErrorCode};
use crate::context::{Authentication, PrincipalContext};

#[derive(Clone)]
pub struct AuthState {
    pub jwt: Arc<dyn JwtValidator>,
}

/// Resolve the bearer token (if any) into an [`Authentication`].
///
/// Never rejects: anonymous routes ignore the result, protected routes reject
/// through the [`PrincipalContext`] extractor.
pub async fn auth_middleware(
    State(state): State<AuthState>,
    mut req: axum::http::Request<axum::body::Body>,
    next: Next,
) -> Response {
    let auth = match extract_bearer(req.headers()) {
        Err(BearerError::Missing) => Authentication::Anonymous,
        Err(BearerError::Malformed) => Authentication::Invalid,
        Ok(token) => match authenticate(state.jwt.as_ref(), token) {
            Some(principal) => Authentication::Authenticated(PrincipalContext::new(principal)),
            None => Authentication::Invalid,
        },
    };

    req.extensions_mut().insert(auth);
    next.run(req).await
}

fn authenticate(jwt: &dyn JwtValidator, token: &str) -> Option<Principal> {
    let claims = jwt
        .validate(token, Utc::now())
        .map_err(|e| tracing::debug!(error = %e, "rejected bearer token"))
        .ok()?;
    let user_id = claims.user_id().ok()?;
    Some(Principal::new(user_id, claims.role))
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum BearerError {
    Missing,
    Malformed,
}

pub fn extract_bearer(headers: &HeaderMap) -> Result<&str, BearerError> {
    let header = headers
        .get(axum::http::header::AUTHORIZATION)
        .ok_or(BearerError::Missing)?;

    let header = header.to_str().map_err(|_| BearerError::Malformed)?;

    let header = header
        .strip_prefix("Bearer ")
        .ok_or(BearerError::Malformed)?;

    let token = header.trim();
    if token.is_empty() {
        return Err(BearerError::Missing);
    }

    Ok(token)
}

#[async_trait]
impl<S: Send + Sync> FromRequestParts<S> for PrincipalContext {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        match parts.extensions.get::<Authentication>() {
            Some(Authentication::Authenticated(principal)) => Ok(*principal),
            Some(Authentication::Invalid) => Err(ErrorCode::BearerTokenInvalid.into()),
            Some(Authentication::Anonymous) | None => Err(ErrorCode::BearerTokenMissing.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(value: &str) -> HeaderMap {
        let mut h = HeaderMap::new();
        h.insert(
            axum::http::header::AUTHORIZATION,
            HeaderValue::from_str(value).unwrap(),
        );
        h
    }

    #[test]
    fn bearer_extraction() {
        assert_eq!(extract_bearer(&headers("Bearer abc")), Ok("abc"));
        assert_eq!(extract_bearer(&headers("Bearer  abc ")), Ok("abc"));
        assert_eq!(extract_bearer(&headers("Basic abc")), Err(BearerError::Malformed));
        assert_eq!(extract_bearer(&headers("Bearer ")), Err(BearerError::Missing));
        assert_eq!(extract_bearer(&HeaderMap::new()), Err(BearerError::Missing));
    }
}
