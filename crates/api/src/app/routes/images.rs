use std::sync::Arc;

use axum::{
    extract::Extension,
    http::header,
    response::{IntoResponse, Response},
    routing::get,
    Router,
};

use skillsgarden_infra::SasQuery;

use crate::app::errors::ApiError;
use crate::app::extract::{ApiPath, ApiQuery};
use crate::app::services::AppServices;
use crate::app::services::images::image_content_type;

/// Target of the signed URLs handed out in responses.
pub fn router() -> Router {
    Router::new().route("/:name", get(get_image))
}

pub async fn get_image(
    Extension(services): Extension<Arc<AppServices>>,
    ApiPath(name): ApiPath<String>,
    ApiQuery(query): ApiQuery<SasQuery>,
) -> Result<Response, ApiError> {
    let bytes = services.fetch_image(&name, &query).await?;
    Ok(([(header::CONTENT_TYPE, image_content_type(&name))], bytes).into_response())
}
