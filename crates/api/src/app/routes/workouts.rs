use std::sync::Arc;

use axum::{
    extract::Extension,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};

use skillsgarden_core::WorkoutId;

use crate::app::dto::{GenerateQuery, WorkoutBody};
use crate::app::errors::ApiError;
use crate::app::extract::{ApiPath, ApiQuery, JsonBody};
use crate::app::services::AppServices;
use crate::authz;
use crate::context::PrincipalContext;

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_workouts).post(create_workout))
        .route("/generate", get(generate_workout))
        .route("/:id", get(get_workout).put(update_workout).delete(delete_workout))
}

pub async fn list_workouts(Extension(services): Extension<Arc<AppServices>>) -> Result<Response, ApiError> {
    Ok(Json(services.list_workouts().await?).into_response())
}

/// `?amount=` defaults to 3 and is clamped to 1..=5; `?movementforms=` is a
/// pipe-delimited list, every form when absent.
pub async fn generate_workout(
    Extension(services): Extension<Arc<AppServices>>,
    ApiQuery(query): ApiQuery<GenerateQuery>,
) -> Result<Response, ApiError> {
    let exercises = services
        .generate_workout(query.amount, query.movementforms.as_deref().unwrap_or_default())
        .await?;
    Ok(Json(exercises).into_response())
}

pub async fn get_workout(
    Extension(services): Extension<Arc<AppServices>>,
    ApiPath(id): ApiPath<WorkoutId>,
) -> Result<Response, ApiError> {
    Ok(Json(services.get_workout(id).await?).into_response())
}

pub async fn create_workout(
    Extension(services): Extension<Arc<AppServices>>,
    principal: PrincipalContext,
    JsonBody(body): JsonBody<WorkoutBody>,
) -> Result<Response, ApiError> {
    authz::require_admin(&principal)?;
    Ok(Json(services.create_workout(body).await?).into_response())
}

pub async fn update_workout(
    Extension(services): Extension<Arc<AppServices>>,
    principal: PrincipalContext,
    ApiPath(id): ApiPath<WorkoutId>,
    JsonBody(body): JsonBody<WorkoutBody>,
) -> Result<Response, ApiError> {
    authz::require_admin(&principal)?;
    Ok(Json(services.update_workout(id, body).await?).into_response())
}

pub async fn delete_workout(
    Extension(services): Extension<Arc<AppServices>>,
    principal: PrincipalContext,
    ApiPath(id): ApiPath<WorkoutId>,
) -> Result<Response, ApiError> {
    authz::require_admin(&principal)?;
    services.delete_workout(id).await?;
    Ok(().into_response())
}
