//! Extractors whose rejections use the API error body instead of axum's
//! plain-text defaults.

use axum::{
    Json, async_trait,
    extract::{FromRequest, FromRequestParts, Multipart, Path, Query, Request, rejection::JsonRejection},
    http::request::Parts,
};
use serde::de::DeserializeOwned;

use crate::app::errors::{ApiError, ErrorCode};

/// Typed path parameters; any parse failure is `INVALID_PATH_PARAMETER`.
#[derive(Debug)]
pub struct ApiPath<T>(pub T);

#[async_trait]
impl<S, T> FromRequestParts<S> for ApiPath<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Send,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        Path::<T>::from_request_parts(parts, state)
            .await
            .map(|Path(value)| ApiPath(value))
            .map_err(|_| ErrorCode::InvalidPathParameter.into())
    }
}

/// Typed query string; any parse failure is `INVALID_QUERY_PARAMETER`.
#[derive(Debug)]
pub struct ApiQuery<T>(pub T);

#[async_trait]
impl<S, T> FromRequestParts<S> for ApiQuery<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Send,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        Query::<T>::from_request_parts(parts, state)
            .await
            .map(|Query(value)| ApiQuery(value))
            .map_err(|_| ErrorCode::InvalidQueryParameter.into())
    }
}

/// JSON body. Type errors report the deserializer message with code 400;
/// unreadable bodies are `INVALID_REQUEST_BODY`.
#[derive(Debug)]
pub struct JsonBody<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for JsonBody<T>
where
    S: Send + Sync,
    T: DeserializeOwned,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(JsonBody(value)),
            Err(JsonRejection::JsonDataError(e)) => Err(ApiError::validation(e.body_text())),
            Err(e) => {
                tracing::debug!(error = %e, "unreadable json body");
                Err(ErrorCode::InvalidRequestBody.into())
            }
        }
    }
}

/// Multipart body; a missing or malformed boundary is `INVALID_REQUEST_BODY`.
pub struct ApiMultipart(pub Multipart);

#[async_trait]
impl<S> FromRequest<S> for ApiMultipart
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        Multipart::from_request(req, state).await.map(ApiMultipart).map_err(|e| {
            tracing::debug!(error = %e, "not a multipart body");
            ErrorCode::InvalidRequestBody.into()
        })
    }
}
