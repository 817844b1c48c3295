use std::sync::Arc;

use axum::{
    extract::Extension,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};

use skillsgarden_core::ExerciseId;

use crate::app::dto::ExerciseBody;
use crate::app::errors::ApiError;
use crate::app::extract::{ApiPath, JsonBody};
use crate::app::services::AppServices;
use crate::authz;
use crate::context::PrincipalContext;

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_exercises).post(create_exercise))
        .route("/:id", get(get_exercise).put(update_exercise).delete(delete_exercise))
}

pub async fn list_exercises(
    Extension(services): Extension<Arc<AppServices>>,
    principal: PrincipalContext,
) -> Result<Response, ApiError> {
    authz::require_admin(&principal)?;
    Ok(Json(services.list_exercises().await?).into_response())
}

pub async fn get_exercise(
    Extension(services): Extension<Arc<AppServices>>,
    ApiPath(id): ApiPath<ExerciseId>,
) -> Result<Response, ApiError> {
    Ok(Json(services.get_exercise(id).await?).into_response())
}

pub async fn create_exercise(
    Extension(services): Extension<Arc<AppServices>>,
    principal: PrincipalContext,
    JsonBody(body): JsonBody<ExerciseBody>,
) -> Result<Response, ApiError> {
    authz::require_admin(&principal)?;
    Ok(Json(services.create_exercise(body).await?).into_response())
}

pub async fn update_exercise(
    Extension(services): Extension<Arc<AppServices>>,
    principal: PrincipalContext,
    ApiPath(id): ApiPath<ExerciseId>,
    JsonBody(body): JsonBody<ExerciseBody>,
) -> Result<Response, ApiError> {
    authz::require_admin(&principal)?;
    Ok(Json(services.update_exercise(id, body).await?).into_response())
}

pub async fn delete_exercise(
    Extension(services): Extension<Arc<AppServices>>,
    principal: PrincipalContext,
    ApiPath(id): ApiPath<ExerciseId>,
) -> Result<Response, ApiError> {
    authz::require_admin(&principal)?;
    services.delete_exercise(id).await?;
    Ok(().into_response())
}
