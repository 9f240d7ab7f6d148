//! OpenAPI documentation configuration

use utoipa::OpenApi;

/// Combined OpenAPI documentation for all APIs
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Notes API",
        version = "0.1.0",
        description = "MongoDB-based REST API for managing notes with soft delete and pagination",
        license(name = "MIT")
    ),
    servers(
        (url = "http://localhost:8080", description = "Local development server")
    ),
    nest(
        (path = "/api/notes", api = domain_notes::ApiDoc)
    ),
    tags(
        (name = "Notes", description = "Note management endpoints (MongoDB)")
    )
)]
pub struct ApiDoc;
