//! OpenAPI documentation.

use utoipa::OpenApi;

use crate::error;
use crate::handlers;
use chunkup_core::models;

const MAINTENANCE_PATH: &str = "/api/v0/uploads/cleanup/all";

/// Returns the OpenAPI spec for the routes actually mounted.
pub fn get_openapi_spec(maintenance_enabled: bool) -> utoipa::openapi::OpenApi {
    let mut spec = ApiDoc::openapi();
    if !maintenance_enabled {
        spec.paths.paths.remove(MAINTENANCE_PATH);
    }
    spec
}

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Chunkup API",
        version = "0.1.0",
        description = "Chunked file upload API (v0). Files are sent as ordered chunks, reassembled server-side and filed under their document category. All upload endpoints are versioned under /api/v0/."
    ),
    paths(
        handlers::uploads::upload_chunk,
        handlers::uploads::cleanup_upload,
        handlers::uploads::cleanup_all,
        handlers::health::health_check,
    ),
    components(
        schemas(
            models::DocumentType,
            models::ChunkAck,
            models::UploadComplete,
            models::ChunkUploadResponse,
            models::CleanupRequest,
            models::CleanupResponse,
            handlers::health::HealthResponse,
            error::ErrorResponse,
        )
    ),
    tags(
        (name = "uploads", description = "Chunked uploads and cleanup"),
        (name = "maintenance", description = "Operator-only endpoints"),
        (name = "health", description = "Liveness"),
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spec_lists_upload_routes() {
        let spec = get_openapi_spec(true);
        assert!(spec.paths.paths.contains_key("/api/v0/uploads/chunk"));
        assert!(spec.paths.paths.contains_key("/api/v0/uploads/cleanup"));
        assert!(spec.paths.paths.contains_key(MAINTENANCE_PATH));
        assert!(spec.paths.paths.contains_key("/health"));
    }

    #[test]
    fn maintenance_route_hidden_when_disabled() {
        let spec = get_openapi_spec(false);
        assert!(!spec.paths.paths.contains_key(MAINTENANCE_PATH));
        assert!(spec.paths.paths.contains_key("/api/v0/uploads/chunk"));
    }
}
