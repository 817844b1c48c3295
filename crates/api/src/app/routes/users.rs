use std::sync::Arc;

use axum::{
    extract::Extension,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};

use skillsgarden_core::{BeaconId, UserId};

use crate::app::dto::UserBody;
use crate::app::errors::{ApiError, ErrorCode};
use crate::app::extract::{ApiPath, JsonBody};
use crate::app::services::AppServices;
use crate::authz;
use crate::context::PrincipalContext;

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_users).post(create_user))
        .route("/:id", get(get_user).put(update_user).delete(delete_user))
        .route("/:id/beacons", get(beacon_logs).delete(delete_beacon_logs))
        .route("/:id/beacons/:bid", post(log_beacon))
        .route("/:id/events", get(registered_events))
}

pub async fn list_users(
    Extension(services): Extension<Arc<AppServices>>,
    principal: PrincipalContext,
) -> Result<Response, ApiError> {
    authz::require_admin(&principal)?;
    Ok(Json(services.list_users().await?).into_response())
}

/// Any signed-in caller may create accounts, but only admins may pick a type
/// other than `User`.
pub async fn create_user(
    Extension(services): Extension<Arc<AppServices>>,
    principal: PrincipalContext,
    JsonBody(body): JsonBody<UserBody>,
) -> Result<Response, ApiError> {
    authz::require_role_assignment(Some(&principal), body.role)?;
    let Some(role) = body.role else {
        return Err(ApiError::validation("Type is required"));
    };
    Ok(Json(services.create_user(body, role).await?).into_response())
}

pub async fn get_user(
    Extension(services): Extension<Arc<AppServices>>,
    principal: PrincipalContext,
    ApiPath(id): ApiPath<UserId>,
) -> Result<Response, ApiError> {
    authz::require_self_or_admin(&principal, id, ErrorCode::CanOnlyViewOwnAccount)?;
    Ok(Json(services.get_user(id).await?).into_response())
}

pub async fn update_user(
    Extension(services): Extension<Arc<AppServices>>,
    principal: PrincipalContext,
    ApiPath(id): ApiPath<UserId>,
    JsonBody(body): JsonBody<UserBody>,
) -> Result<Response, ApiError> {
    authz::require_self_or_admin(&principal, id, ErrorCode::CanOnlyEditOwnAccount)?;
    authz::require_role_assignment(Some(&principal), body.role)?;
    Ok(Json(services.update_user(id, body).await?).into_response())
}

pub async fn delete_user(
    Extension(services): Extension<Arc<AppServices>>,
    principal: PrincipalContext,
    ApiPath(id): ApiPath<UserId>,
) -> Result<Response, ApiError> {
    if !principal.is_admin() {
        return Err(ErrorCode::UnauthorizedToDeleteUser.into());
    }
    services.delete_user(id).await?;
    Ok(().into_response())
}

pub async fn beacon_logs(
    Extension(services): Extension<Arc<AppServices>>,
    principal: PrincipalContext,
    ApiPath(id): ApiPath<UserId>,
) -> Result<Response, ApiError> {
    authz::require_self(&principal, id, ErrorCode::GetOnlyLogYourself)?;
    Ok(Json(services.beacon_logs(id).await?).into_response())
}

pub async fn log_beacon(
    Extension(services): Extension<Arc<AppServices>>,
    principal: PrincipalContext,
    ApiPath((id, beacon_id)): ApiPath<(UserId, BeaconId)>,
) -> Result<Response, ApiError> {
    authz::require_self(&principal, id, ErrorCode::OnlyLogYourself)?;
    Ok(Json(services.log_beacon(id, beacon_id).await?).into_response())
}

pub async fn delete_beacon_logs(
    Extension(services): Extension<Arc<AppServices>>,
    principal: PrincipalContext,
    ApiPath(id): ApiPath<UserId>,
) -> Result<Response, ApiError> {
    authz::require_self(&principal, id, ErrorCode::OnlyDeleteOwnLogs)?;
    services.delete_beacon_logs(id).await?;
    Ok(().into_response())
}

pub async fn registered_events(
    Extension(services): Extension<Arc<AppServices>>,
    principal: PrincipalContext,
    ApiPath(id): ApiPath<UserId>,
) -> Result<Response, ApiError> {
    authz::require_self_or_admin(&principal, id, ErrorCode::CanOnlyViewOwnRegistrations)?;
    Ok(Json(services.registered_events(id).await?).into_response())
}
