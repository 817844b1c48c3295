use std::sync::Arc;

use axum::{
    extract::Extension,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};

use skillsgarden_core::LocationId;

use crate::app::errors::ApiError;
use crate::app::extract::{ApiMultipart, ApiPath};
use crate::app::form::{FormData, LOCATION_FORM};
use crate::app::routes::{components, events};
use crate::app::services::AppServices;
use crate::authz;
use crate::context::PrincipalContext;

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_locations).post(create_location))
        .route("/:id", get(get_location).put(update_location).delete(delete_location))
        .nest("/:id/components", components::router())
        .nest("/:id/events", events::router())
}

pub async fn list_locations(Extension(services): Extension<Arc<AppServices>>) -> Result<Response, ApiError> {
    Ok(Json(services.list_locations().await?).into_response())
}

pub async fn get_location(
    Extension(services): Extension<Arc<AppServices>>,
    ApiPath(id): ApiPath<LocationId>,
) -> Result<Response, ApiError> {
    Ok(Json(services.get_location(id).await?).into_response())
}

pub async fn create_location(
    Extension(services): Extension<Arc<AppServices>>,
    principal: PrincipalContext,
    ApiMultipart(multipart): ApiMultipart,
) -> Result<Response, ApiError> {
    authz::require_admin(&principal)?;
    let form = FormData::read(multipart, LOCATION_FORM).await?;
    Ok(Json(services.create_location(form).await?).into_response())
}

pub async fn update_location(
    Extension(services): Extension<Arc<AppServices>>,
    principal: PrincipalContext,
    ApiPath(id): ApiPath<LocationId>,
    ApiMultipart(multipart): ApiMultipart,
) -> Result<Response, ApiError> {
    authz::require_admin(&principal)?;
    services.ensure_location(id).await?;
    let form = FormData::read(multipart, LOCATION_FORM).await?;
    Ok(Json(services.update_location(id, form).await?).into_response())
}

pub async fn delete_location(
    Extension(services): Extension<Arc<AppServices>>,
    principal: PrincipalContext,
    ApiPath(id): ApiPath<LocationId>,
) -> Result<Response, ApiError> {
    authz::require_admin(&principal)?;
    services.delete_location(id).await?;
    Ok(().into_response())
}
