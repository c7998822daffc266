//! # imgvault: signed, content-addressed image uploads
//!
//! `imgvault` accepts image uploads over HTTP and serves them back from a stable public URL.
//! Every upload carries a BIP-340 Schnorr signature over the SHA-256 digest of the file, made
//! with a secp256k1 x-only key. Files are stored under a path derived from that digest, so the
//! same bytes always land in the same place and resolve to the same URL.
//!
//! ## Request Flow
//!
//! A `POST /upload` request moves through a fixed sequence, and the first failing step decides
//! the response:
//!
//! 1. **Intake** ([`api::handlers::uploads`]): the multipart form is read under a 5 MiB cap
//! 2. **Classify** ([`sniff`]): the leading bytes must be a JPEG or PNG signature
//! 3. **Digest** ([`digest`]): SHA-256 over the exact file bytes
//! 4. **Authorize** ([`auth`]): the signature must verify against the digest, and the key must
//!    be on the allowlist when one is configured
//! 5. **Store** ([`storage`]): the file is written atomically under
//!    `<dir>/<3>/<3>/<3>/<3>/<digest><ext>`
//! 6. **Respond**: JSON `{"name", "url"}` with `url` pointing under `/static/`
//!
//! Nothing touches disk until step 5, so rejected uploads leave no trace.
//!
//! ## Quick Start
//!
//! ```no_run
//! use clap::Parser;
//! use imgvault::{Application, Config};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let args = imgvault::config::Args::parse();
//!     let config = Config::load(&args)?;
//!
//!     imgvault::telemetry::init_telemetry(&config.log_level)?;
//!
//!     let app = Application::new(config).await?;
//!
//!     app.serve(async {
//!         let _ = tokio::signal::ctrl_c().await;
//!     })
//!     .await?;
//!
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod auth;
pub mod config;
pub mod digest;
pub mod errors;
pub mod openapi;
pub mod sniff;
pub mod storage;
pub mod telemetry;

#[cfg(test)]
pub(crate) mod test_utils;

use anyhow::Context;
use api::handlers::uploads::MAX_UPLOAD_SIZE;
use auth::Authorizer;
use axum::{
    Json, Router,
    extract::DefaultBodyLimit,
    middleware::from_fn,
    routing::{get, post},
};
use bon::Builder;
pub use config::Config;
use openapi::ApiDoc;
use std::{
    future::IntoFuture,
    path::{Path, PathBuf},
    sync::Arc,
};
use storage::{FileStorage, LocalFileStorage};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tower::Layer;
use tower_http::{
    services::ServeDir,
    trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::{Level, debug, info, warn};
use url::Url;
use utoipa::OpenApi;

/// Application state shared across all request handlers.
///
/// # Fields
///
/// - `config`: Application configuration loaded from file, environment and flags
/// - `domain`: Public base URL that returned links are built on
/// - `storage`: Backend that stored files are written to
/// - `authorizer`: Signature and allowlist checks, read-only after startup
///
/// # Example
///
/// ```ignore
/// let state = AppState::builder()
///     .config(config)
///     .domain(domain)
///     .storage(Arc::new(storage))
///     .authorizer(Arc::new(authorizer))
///     .build();
/// ```
#[derive(Clone, Builder)]
pub struct AppState {
    pub config: Config,
    pub domain: Url,
    pub storage: Arc<dyn FileStorage>,
    pub authorizer: Arc<Authorizer>,
}

/// Build the application router.
///
/// `static_root` is the directory served under `/static`; it must be the root `state.storage`
/// writes to for returned URLs to resolve.
pub fn build_router(state: AppState, static_root: &Path) -> Router {
    // Upload route with its own body limit
    let upload_router = Router::new().route(
        "/upload",
        post(api::handlers::uploads::upload_image).layer(DefaultBodyLimit::max(MAX_UPLOAD_SIZE)),
    );

    let router = Router::new()
        .route("/healthz", get(|| async { "OK" }))
        .route("/openapi.json", get(|| async { Json(ApiDoc::openapi()) }))
        .merge(upload_router)
        .with_state(state)
        .nest_service(
            &format!("/{}", api::STATIC_PREFIX),
            from_fn(api::handlers::static_files::hide_dotfiles).layer(ServeDir::new(static_root)),
        );

    router.layer(
        TraceLayer::new_for_http()
            .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
            .on_request(DefaultOnRequest::new().level(Level::INFO))
            .on_response(DefaultOnResponse::new().level(Level::INFO)),
    )
}

/// Main application struct that owns the router and its configuration.
///
/// # Lifecycle
///
/// 1. **Create**: [`Application::new`] validates the configuration, prepares the storage root
///    and builds the router
/// 2. **Serve**: [`Application::serve`] binds to a TCP port and starts handling requests
/// 3. **Shutdown**: When the shutdown future resolves, new connections stop being accepted and
///    in-flight requests get `shutdown_grace_period` to finish
pub struct Application {
    router: Router,
    config: Config,
    storage_root: PathBuf,
}

impl Application {
    /// Create a new application instance with all resources initialized
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        debug!("Starting imgvault with configuration: {:#?}", config);

        config.validate()?;
        let domain = config.domain.clone().context("domain must be configured")?;

        let storage = LocalFileStorage::create(&config.dir).await?;
        let storage_root = storage.root().to_path_buf();

        info!(%domain, root = %storage_root.display(), "Storage ready");

        let authorizer = Authorizer::new(config.allowlist());
        if authorizer.allowlist().is_enabled() {
            info!(keys = authorizer.allowlist().len(), "Upload allowlist enabled");
        } else {
            warn!("No pubkeys configured, any key with a valid signature may upload");
        }

        let state = AppState::builder()
            .config(config.clone())
            .domain(domain)
            .storage(Arc::new(storage))
            .authorizer(Arc::new(authorizer))
            .build();

        let router = build_router(state, &storage_root);

        Ok(Self {
            router,
            config,
            storage_root,
        })
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
            "imgvault listening on http://{}, serving files from {}",
            bind_addr,
            self.storage_root.display()
        );

        let shutdown_token = CancellationToken::new();
        let server = axum::serve(listener, self.router.into_make_service())
            .with_graceful_shutdown(shutdown_token.clone().cancelled_owned())
            .into_future();
        let mut server = std::pin::pin!(server);

        tokio::select! {
            result = &mut server => {
                result?;
                return Ok(());
            }
            _ = shutdown => {}
        }

        // Stop accepting connections, then give in-flight requests a bounded time to finish
        shutdown_token.cancel();
        let grace_period = self.config.shutdown_grace_period;
        match tokio::time::timeout(grace_period, server).await {
            Ok(result) => result?,
            Err(_) => warn!(?grace_period, "Grace period elapsed, dropping remaining connections"),
        }

        info!("Server stopped");
        Ok(())
    }
}
