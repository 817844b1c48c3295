use std::sync::Arc;

use axum::{
    extract::Extension,
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};

use skillsgarden_auth::Role;

use crate::app::dto::{LoginRequest, UserBody};
use crate::app::errors::{ApiError, ErrorCode};
use crate::app::extract::JsonBody;
use crate::app::services::AppServices;
use crate::authz;

pub fn router() -> Router {
    Router::new()
        .route("/login", post(login))
        .route("/register", post(register))
}

pub async fn login(
    Extension(services): Extension<Arc<AppServices>>,
    JsonBody(body): JsonBody<LoginRequest>,
) -> Result<Response, ApiError> {
    let (Some(email), Some(password)) = (body.email, body.password) else {
        return Err(ErrorCode::InvalidRequestBody.into());
    };
    let session = services.login(&email, &password).await?;
    Ok(Json(session).into_response())
}

/// Self-service sign up; always creates a `User` account.
pub async fn register(
    Extension(services): Extension<Arc<AppServices>>,
    JsonBody(body): JsonBody<UserBody>,
) -> Result<Response, ApiError> {
    authz::require_role_assignment(None, body.role)?;
    let user = services.create_user(body, Role::User).await?;
    Ok(Json(user).into_response())
}
