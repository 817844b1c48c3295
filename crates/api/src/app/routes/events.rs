use std::sync::Arc;

use axum::{
    extract::Extension,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};

use skillsgarden_auth::Role;
use skillsgarden_core::{EventId, LocationId};

use crate::app::dto::EventListQuery;
use crate::app::errors::ApiError;
use crate::app::extract::{ApiMultipart, ApiPath, ApiQuery};
use crate::app::form::{EVENT_FORM, FormData};
use crate::app::services::AppServices;
use crate::authz;
use crate::context::PrincipalContext;

/// Mounted under `/locations/:id/events`.
pub fn router() -> Router {
    Router::new()
        .route("/", get(list_events).post(create_event))
        .route("/:eid", get(get_event).put(update_event).delete(delete_event))
        .route("/:eid/users", post(register).delete(unregister))
}

pub async fn list_events(
    Extension(services): Extension<Arc<AppServices>>,
    ApiPath(location_id): ApiPath<LocationId>,
    ApiQuery(query): ApiQuery<EventListQuery>,
) -> Result<Response, ApiError> {
    let events = services.list_events(location_id, query.all.unwrap_or(false)).await?;
    Ok(Json(events).into_response())
}

pub async fn get_event(
    Extension(services): Extension<Arc<AppServices>>,
    ApiPath((location_id, event_id)): ApiPath<(LocationId, EventId)>,
) -> Result<Response, ApiError> {
    Ok(Json(services.get_event(location_id, event_id).await?).into_response())
}

/// The caller becomes the organiser.
pub async fn create_event(
    Extension(services): Extension<Arc<AppServices>>,
    principal: PrincipalContext,
    ApiPath(location_id): ApiPath<LocationId>,
    ApiMultipart(multipart): ApiMultipart,
) -> Result<Response, ApiError> {
    authz::require_any(&principal, &[Role::Admin, Role::Organiser])?;
    services.ensure_location(location_id).await?;
    let form = FormData::read(multipart, EVENT_FORM).await?;
    let event = services.create_event(location_id, principal.user_id(), form).await?;
    Ok(Json(event).into_response())
}

pub async fn update_event(
    Extension(services): Extension<Arc<AppServices>>,
    principal: PrincipalContext,
    ApiPath((location_id, event_id)): ApiPath<(LocationId, EventId)>,
    ApiMultipart(multipart): ApiMultipart,
) -> Result<Response, ApiError> {
    authz::require_admin(&principal)?;
    services.event_in_location(location_id, event_id).await?;
    let form = FormData::read(multipart, EVENT_FORM).await?;
    Ok(Json(services.update_event(location_id, event_id, form).await?).into_response())
}

pub async fn delete_event(
    Extension(services): Extension<Arc<AppServices>>,
    principal: PrincipalContext,
    ApiPath((location_id, event_id)): ApiPath<(LocationId, EventId)>,
) -> Result<Response, ApiError> {
    authz::require_admin(&principal)?;
    services.delete_event(location_id, event_id).await?;
    Ok(().into_response())
}

pub async fn register(
    Extension(services): Extension<Arc<AppServices>>,
    principal: PrincipalContext,
    ApiPath((location_id, event_id)): ApiPath<(LocationId, EventId)>,
) -> Result<Response, ApiError> {
    services
        .register_for_event(location_id, event_id, principal.user_id())
        .await?;
    Ok(().into_response())
}

pub async fn unregister(
    Extension(services): Extension<Arc<AppServices>>,
    principal: PrincipalContext,
    ApiPath((location_id, event_id)): ApiPath<(LocationId, EventId)>,
) -> Result<Response, ApiError> {
    services
        .unregister_from_event(location_id, event_id, principal.user_id())
        .await?;
    Ok(().into_response())
}
