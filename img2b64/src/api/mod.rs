//! HTTP surface of the converter.
//!
//! - **[`handlers`]**: Axum route handlers
//! - **[`models`]**: Request/response bodies
//!
//! Endpoints:
//!
//! - `POST /upload`: multipart image upload, answered with its Base64 encoding
//! - `POST /decode`: Base64 text (or a `data:` URI) back to image bytes
//! - `GET /*`: the converter page and its embedded assets
//!
//! OpenAPI documentation is served at `/openapi.json`, with a browsable UI at `/docs`.

pub mod handlers;
pub mod models;
