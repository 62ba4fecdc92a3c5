//! Route paths shared by the router, handlers, OpenAPI annotations and tests.

/// Prefix for every document endpoint
pub const DOCUMENTS_PATH: &str = "/api/documents";

/// Served OpenAPI document
pub const OPENAPI_PATH: &str = "/api/openapi.json";

/// Interactive API documentation
pub const DOCS_PATH: &str = "/docs";

/// Multipart field carrying the document bytes
pub const FILE_FIELD: &str = "file";

/// Optional multipart text field
pub const DESCRIPTION_FIELD: &str = "description";
