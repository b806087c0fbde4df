//! HTTP request handlers.
//!
//! - [`upload`]: multipart image upload to Base64
//! - [`decode`]: Base64 back to image bytes
//! - [`static_assets`]: the converter page, embedded assets, and the catch-all fallback
//!
//! # Error Handling
//!
//! Handlers work in terms of [`crate::errors::Error`] and attach the request's language with
//! [`crate::errors::Error::with_language`] before responding, so JSON error messages come out of
//! the same translation table as the page.

pub mod decode;
pub mod static_assets;
pub mod upload;

use axum::{
    extract::{Query, rejection::QueryRejection},
    http::{HeaderMap, header},
};

use crate::api::models::LanguageQuery;
use crate::config::Config;
use crate::page::Language;

/// Language for this request: `?lang=`, then `Accept-Language`, then the configured default.
pub(crate) fn request_language(config: &Config, query: &Result<Query<LanguageQuery>, QueryRejection>, headers: &HeaderMap) -> Language {
    let lang = query.as_ref().ok().and_then(|q| q.lang.as_deref());
    let accept_language = headers.get(header::ACCEPT_LANGUAGE).and_then(|v| v.to_str().ok());
    Language::negotiate(lang, accept_language, config.ui.default_language)
}
