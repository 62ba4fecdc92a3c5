//! OpenAPI documentation.

use utoipa::OpenApi;

use crate::handlers;
use docupload_core::{ApiError, ApiSettings, UploadResponse};

/// Returns the OpenAPI document with title, version and description from configuration.
pub fn get_openapi_spec(settings: &ApiSettings) -> utoipa::openapi::OpenApi {
    let mut spec = ApiDoc::openapi();
    spec.info.title = settings.title.clone();
    spec.info.version = settings.version.clone();
    spec.info.description = Some(settings.description.clone());
    spec
}

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Document Upload API",
        version = "v1",
        description = "A minimal API for document upload operations"
    ),
    paths(
        handlers::document_upload::upload_document,
        handlers::health::service_health,
        handlers::health::health_check,
    ),
    components(schemas(
        UploadResponse,
        ApiError,
        handlers::document_upload::UploadDocumentForm,
        handlers::health::ServiceHealthResponse,
        handlers::health::HealthCheckResponse,
        handlers::health::HealthChecks,
    )),
    tags(
        (name = "Document Upload", description = "Upload documents to local storage"),
        (name = "Health", description = "Service health checks")
    )
)]
pub struct ApiDoc;
