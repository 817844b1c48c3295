use std::sync::Arc;

use axum::{
    extract::Extension,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};

use skillsgarden_core::{ComponentId, LocationId};

use crate::app::errors::ApiError;
use crate::app::extract::{ApiMultipart, ApiPath};
use crate::app::form::{COMPONENT_FORM, FormData};
use crate::app::services::AppServices;
use crate::authz;
use crate::context::PrincipalContext;

/// Mounted under `/locations/:id/components`.
pub fn router() -> Router {
    Router::new()
        .route("/", get(list_components).post(create_component))
        .route("/:cid", get(get_component).put(update_component).delete(delete_component))
        .route("/:cid/exercises", get(component_exercises))
}

pub async fn list_components(
    Extension(services): Extension<Arc<AppServices>>,
    ApiPath(location_id): ApiPath<LocationId>,
) -> Result<Response, ApiError> {
    Ok(Json(services.list_components(location_id).await?).into_response())
}

pub async fn get_component(
    Extension(services): Extension<Arc<AppServices>>,
    ApiPath((location_id, component_id)): ApiPath<(LocationId, ComponentId)>,
) -> Result<Response, ApiError> {
    Ok(Json(services.get_component(location_id, component_id).await?).into_response())
}

pub async fn create_component(
    Extension(services): Extension<Arc<AppServices>>,
    principal: PrincipalContext,
    ApiPath(location_id): ApiPath<LocationId>,
    ApiMultipart(multipart): ApiMultipart,
) -> Result<Response, ApiError> {
    authz::require_admin(&principal)?;
    services.ensure_location(location_id).await?;
    let form = FormData::read(multipart, COMPONENT_FORM).await?;
    Ok(Json(services.create_component(location_id, form).await?).into_response())
}

pub async fn update_component(
    Extension(services): Extension<Arc<AppServices>>,
    principal: PrincipalContext,
    ApiPath((location_id, component_id)): ApiPath<(LocationId, ComponentId)>,
    ApiMultipart(multipart): ApiMultipart,
) -> Result<Response, ApiError> {
    authz::require_admin(&principal)?;
    services.component_in_location(location_id, component_id).await?;
    let form = FormData::read(multipart, COMPONENT_FORM).await?;
    Ok(Json(services.update_component(location_id, component_id, form).await?).into_response())
}

pub async fn delete_component(
    Extension(services): Extension<Arc<AppServices>>,
    principal: PrincipalContext,
    ApiPath((location_id, component_id)): ApiPath<(LocationId, ComponentId)>,
) -> Result<Response, ApiError> {
    authz::require_admin(&principal)?;
    services.delete_component(location_id, component_id).await?;
    Ok(().into_response())
}

pub async fn component_exercises(
    Extension(services): Extension<Arc<AppServices>>,
    ApiPath((location_id, component_id)): ApiPath<(LocationId, ComponentId)>,
) -> Result<Response, ApiError> {
    Ok(Json(services.component_exercises(location_id, component_id).await?).into_response())
}
