//! HTTP handlers for the converter page, embedded assets, and everything unrouted.

use axum::{
    extract::{Query, State, rejection::QueryRejection},
    http::{HeaderMap, Method, Uri, header},
    response::{Html, IntoResponse, Response},
};
use tracing::{debug, instrument};

use crate::AppState;
use crate::api::handlers::request_language;
use crate::api::models::LanguageQuery;
use crate::errors::Error;
use crate::{page, static_assets};

/// The page template is rendered, never served raw.
const TEMPLATE_PATH: &str = "index.html";

/// Serve an embedded asset by path, if one exists.
fn serve_embedded_asset(path: &str) -> Option<Response> {
    let path = path.trim_start_matches('/');
    if path.is_empty() || path == TEMPLATE_PATH {
        return None;
    }

    let content = static_assets::Assets::get(path)?;
    let mime = mime_guess::from_path(path).first_or_octet_stream();

    Some(
        (
            [
                (header::CONTENT_TYPE, mime.as_ref().to_string()),
                (header::CACHE_CONTROL, "no-cache".to_string()),
            ],
            content.data.into_owned(),
        )
            .into_response(),
    )
}

/// Catch-all handler.
///
/// `GET`/`HEAD` requests get an embedded asset when the path names one and the converter page
/// otherwise. Any other method is an invalid request.
#[instrument(skip_all, fields(method = %method, path = %uri.path()))]
pub async fn fallback(
    State(state): State<AppState>,
    method: Method,
    uri: Uri,
    query: Result<Query<LanguageQuery>, QueryRejection>,
    headers: HeaderMap,
) -> Response {
    let language = request_language(&state.config, &query, &headers);

    if method != Method::GET && method != Method::HEAD {
        return Error::InvalidRequest {
            method: method.to_string(),
            path: uri.path().to_string(),
        }
        .with_language(language)
        .into_response();
    }

    if let Some(asset) = serve_embedded_asset(uri.path()) {
        return asset;
    }

    debug!("Serving converter page in {}", language);
    match page::render_index(language, &state.config.formats.supported) {
        Ok(html) => ([(header::CACHE_CONTROL, "no-cache")], Html(html)).into_response(),
        Err(e) => e.with_language(language).into_response(),
    }
}
