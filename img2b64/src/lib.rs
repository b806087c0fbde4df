//! # img2b64: Image to Base64 conversion service
//!
//! `img2b64` serves a small converter page and two JSON endpoints:
//!
//! - `POST /upload` takes a `multipart/form-data` upload (`image` file part, optional `format`)
//!   and answers `{"base64": "..."}`.
//! - `POST /decode` takes `{"base64": "..."}` (or a `data:` URI) and answers with the image bytes,
//!   typed by signature detection.
//!
//! Every other `GET` serves the page (or one of its embedded assets); anything else is answered
//! with `400 Invalid Request`.
//!
//! ## Architecture
//!
//! The conversion core is two pure modules with no HTTP knowledge:
//!
//! - [`codec`]: bytes ↔ standard padded Base64, plus `data:` URI helpers
//! - [`format`]: the [`format::ImageFormat`] enumeration and its extension and signature lookups
//!
//! The HTTP layer ([`api`]) is built on [Axum](https://github.com/tokio-rs/axum). Supported
//! formats, the upload size limit, signature verification and the default page language all come
//! from [`config::Config`], so one binary covers what used to be several hand-edited variants.
//! User-facing text lives in one translation table ([`page::Translations`]) and the language is
//! chosen per request.
//!
//! ## Quick Start
//!
//! ```no_run
//! use clap::Parser;
//! use img2b64::{Application, Config};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let args = img2b64::config::Args::parse();
//!     let config = Config::load(&args)?;
//!
//!     img2b64::telemetry::init_telemetry(config.enable_otel_export)?;
//!
//!     Application::new(config)?
//!         .serve(async {
//!             tokio::signal::ctrl_c().await.expect("Failed to listen for Ctrl+C");
//!         })
//!         .await
//! }
//! ```
pub mod api;
pub mod codec;
pub mod config;
pub mod errors;
pub mod format;
mod openapi;
pub mod page;
mod static_assets;
pub mod telemetry;

#[cfg(test)]
mod test_utils;

use axum::{
    Json, Router,
    extract::DefaultBodyLimit,
    routing::{MethodRouter, get, post},
};
use bon::Builder;
pub use config::Config;
use tokio::net::TcpListener;
use tower_http::trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer};
use tracing::{Level, debug, info, instrument};
use utoipa::OpenApi;
use utoipa_scalar::{Scalar, Servable};

use crate::api::handlers::{decode, static_assets::fallback, upload};
use crate::openapi::ApiDoc;

/// Application state shared across all request handlers.
///
/// ```ignore
/// let state = AppState::builder().config(config).build();
/// ```
#[derive(Clone, Builder)]
pub struct AppState {
    pub config: Config,
}

/// Routes answer unknown methods the same way unknown paths are answered.
fn with_fallback(route: MethodRouter<AppState>) -> MethodRouter<AppState> {
    route.fallback(fallback)
}

/// Build the application router.
///
/// - `POST /upload`, `POST /decode`: conversion endpoints
/// - `GET /healthz`: liveness
/// - `GET /openapi.json`, `GET /docs`: API documentation
/// - everything else: [`fallback`] (page, embedded assets, or `400 Invalid Request`)
///
/// Request bodies are capped at `limits.max_upload_size` (0 disables the cap).
#[instrument(skip_all)]
pub fn build_router(state: &AppState) -> Router {
    let body_limit = match state.config.limits.max_upload_size {
        0 => DefaultBodyLimit::disable(),
        limit => DefaultBodyLimit::max(limit),
    };

    let router = Router::new()
        .route("/upload", with_fallback(post(upload::upload_image)))
        .route("/decode", with_fallback(post(decode::decode_image)))
        .route("/healthz", with_fallback(get(|| async { "OK" })))
        .route("/openapi.json", with_fallback(get(|| async { Json(ApiDoc::openapi()) })))
        .fallback(fallback)
        .layer(body_limit)
        .with_state(state.clone())
        .merge(Scalar::with_url("/docs", ApiDoc::openapi()));

    router.layer(
        TraceLayer::new_for_http()
            .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
            .on_request(DefaultOnRequest::new().level(Level::INFO))
            .on_response(DefaultOnResponse::new().level(Level::INFO)),
    )
}

pub struct Application {
    router: Router,
    config: Config,
}

impl Application {
    /// Validate the configuration and build the router
    pub fn new(config: Config) -> anyhow::Result<Self> {
        debug!("Starting img2b64 with configuration: {:#?}", config);
        config.validate()?;

        let state = AppState::builder().config(config.clone()).build();
        let router = build_router(&state);

        Ok(Self { router, config })
    }

    /// Convert application into a test server (for tests)
    #[cfg(test)]
    pub fn into_test_server(self) -> axum_test::TestServer {
        axum_test::TestServer::new(self.router).expect("Failed to create test server")
    }

    /// Start serving the application
    pub async fn serve<F>(self, shutdown: F) -> anyhow::Result<()>
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        let bind_addr = self.config.bind_address();
        let listener = TcpListener::bind(&bind_addr).await?;
        info!(
            "img2b64 listening on http://{}, available at http://localhost:{}",
            bind_addr,
            listener.local_addr()?.port()
        );

        axum::serve(listener, self.router.into_make_service())
            .with_graceful_shutdown(shutdown)
            .await?;

        info!("Shutting down telemetry...");
        telemetry::shutdown_telemetry();

        Ok(())
    }
}
