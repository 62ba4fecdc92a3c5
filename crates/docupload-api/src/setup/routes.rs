//! Route configuration and setup.

use crate::constants::{DOCS_PATH, DOCUMENTS_PATH, OPENAPI_PATH};
use crate::handlers::{document_upload, health};
use crate::state::AppState;
use axum::{
    extract::DefaultBodyLimit,
    http::{HeaderValue, Method},
    routing::{get, post},
    Router,
};
use docupload_core::Config;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use utoipa_rapidoc::RapiDoc;

/// Setup all application routes
pub fn setup_routes(config: &Config, state: Arc<AppState>) -> Result<Router<()>, anyhow::Error> {
    let cors = setup_cors(config)?;

    // Upload size is enforced while spooling, so the framework body limit is lifted.
    let documents = Router::new()
        .route("/upload", post(document_upload::upload_document))
        .route("/health", get(health::service_health))
        .layer(DefaultBodyLimit::disable());

    let openapi = crate::api_doc::get_openapi_spec(&config.api);

    let app = Router::new()
        .nest(DOCUMENTS_PATH, documents)
        .route("/health", get(health::health_check))
        .route("/", get(health::root_redirect))
        .with_state(state)
        .merge(RapiDoc::with_openapi(OPENAPI_PATH, openapi).path(DOCS_PATH))
        .layer(cors)
        .layer(TraceLayer::new_for_http());

    Ok(app)
}

fn setup_cors(config: &Config) -> Result<CorsLayer, anyhow::Error> {
    let methods = [Method::GET, Method::POST, Method::OPTIONS];
    let cors = if config.cors_origins().iter().any(|o| o == "*") {
        if config.is_production() {
            return Err(anyhow::anyhow!(
                "CORS_ORIGINS cannot be '*' in production. Please specify explicit origins."
            ));
        }
        tracing::warn!("CORS configured to allow all origins - not recommended for production");
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(methods)
            .allow_headers(Any)
    } else {
        let origins = config
            .cors_origins()
            .iter()
            .map(|o| {
                o.parse::<HeaderValue>()
                    .map_err(|_| anyhow::anyhow!("Invalid CORS origin: {}", o))
            })
            .collect::<Result<Vec<_>, _>>()?;
        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(methods)
            .allow_headers(Any)
    };
    Ok(cors)
}
