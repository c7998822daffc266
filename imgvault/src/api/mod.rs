//! API layer for HTTP request handling and data models.
//!
//! - **[`handlers`]**: Axum route handlers
//! - **[`models`]**: Request/response data structures
//!
//! # API Structure
//!
//! - **Upload** (`POST /upload`): Signed multipart image upload
//! - **Static files** (`GET /static/*`): Stored files, served straight from the storage root
//! - **Health** (`GET /healthz`): Liveness probe
//! - **Docs** (`GET /openapi.json`): OpenAPI document for the upload endpoint

pub mod handlers;
pub mod models;

/// First URL path segment under which stored files are served.
pub const STATIC_PREFIX: &str = "static";
