use std::sync::Arc;

use axum::{
    extract::Extension,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};

use skillsgarden_core::BeaconId;

use crate::app::dto::BeaconBody;
use crate::app::errors::ApiError;
use crate::app::extract::{ApiPath, JsonBody};
use crate::app::services::AppServices;
use crate::authz;
use crate::context::PrincipalContext;

/// Beacon administration; every endpoint is admin only.
pub fn router() -> Router {
    Router::new()
        .route("/", get(list_beacons).post(create_beacon))
        .route("/:id", get(get_beacon).put(update_beacon).delete(delete_beacon))
}

pub async fn list_beacons(
    Extension(services): Extension<Arc<AppServices>>,
    principal: PrincipalContext,
) -> Result<Response, ApiError> {
    authz::require_admin(&principal)?;
    Ok(Json(services.list_beacons().await?).into_response())
}

pub async fn get_beacon(
    Extension(services): Extension<Arc<AppServices>>,
    principal: PrincipalContext,
    ApiPath(id): ApiPath<BeaconId>,
) -> Result<Response, ApiError> {
    authz::require_admin(&principal)?;
    Ok(Json(services.get_beacon(id).await?).into_response())
}

pub async fn create_beacon(
    Extension(services): Extension<Arc<AppServices>>,
    principal: PrincipalContext,
    JsonBody(body): JsonBody<BeaconBody>,
) -> Result<Response, ApiError> {
    authz::require_admin(&principal)?;
    Ok(Json(services.create_beacon(body).await?).into_response())
}

pub async fn update_beacon(
    Extension(services): Extension<Arc<AppServices>>,
    principal: PrincipalContext,
    ApiPath(id): ApiPath<BeaconId>,
    JsonBody(body): JsonBody<BeaconBody>,
) -> Result<Response, ApiError> {
    authz::require_admin(&principal)?;
    Ok(Json(services.update_beacon(id, body).await?).into_response())
}

pub async fn delete_beacon(
    Extension(services): Extension<Arc<AppServices>>,
    principal: PrincipalContext,
    ApiPath(id): ApiPath<BeaconId>,
) -> Result<Response, ApiError> {
    authz::require_admin(&principal)?;
    services.delete_beacon(id).await?;
    Ok(().into_response())
}
