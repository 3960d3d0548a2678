#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Actix-Web API server for the bubble map.
//!
//! Loads both datasets once at startup, renders the default selection, and
//! serves the REST API a browser-side map widget drives: the initial view,
//! the selector options, selection changes, and the current marker layer
//! as `GeoJSON`. There is a single session marker layer per process.

mod handlers;

use std::sync::{Arc, Mutex};

use actix_cors::Cors;
use actix_web::{App, HttpServer, middleware, web};
use bubble_map_config::{AppConfig, MapViewConfig};
use bubble_map_loader::{CategorySchema, DataSource, LoadError};
use bubble_map_render::{Encoding, MapSession};
use thiserror::Error;

/// Errors that can stop the server.
#[derive(Debug, Error)]
pub enum ServerError {
    /// The datasets could not be loaded.
    #[error(transparent)]
    Load(#[from] LoadError),

    /// The HTTP server failed to bind or crashed.
    #[error("Server error: {0}")]
    Io(#[from] std::io::Error),
}

/// Shared application state.
pub struct AppState {
    /// The session; renders lock it so they never interleave.
    pub session: Mutex<MapSession>,
    /// Initial view handed to the map widget.
    pub map_view: MapViewConfig,
}

impl AppState {
    /// Wraps a session for sharing across workers.
    #[must_use]
    pub const fn new(session: MapSession, map_view: MapViewConfig) -> Self {
        Self {
            session: Mutex::new(session),
            map_view,
        }
    }
}

/// Loads both datasets and renders the default selection.
///
/// # Errors
///
/// Returns [`LoadError`] if either dataset cannot be loaded.
#[allow(clippy::future_not_send)]
pub async fn load_session(config: &AppConfig) -> Result<MapSession, LoadError> {
    let client = reqwest::Client::new();
    let dataset = bubble_map_loader::load(
        &client,
        &DataSource::parse(&config.data.stats),
        &DataSource::parse(&config.data.geo),
        &CategorySchema::from_config(config.data.categories.as_deref()),
    )
    .await?;

    let mut session = MapSession::new(Arc::new(dataset), Encoding::from(&config.render));
    session.render_initial();
    Ok(session)
}

/// Registers the `/api` routes.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api")
            .route("/health", web::get().to(handlers::health))
            .route("/map", web::get().to(handlers::map_view))
            .route("/options", web::get().to(handlers::options))
            .route("/selection", web::get().to(handlers::current_selection))
            .route("/selection", web::put().to(handlers::select))
            .route("/markers", web::get().to(handlers::markers)),
    );
}

/// Starts the bubble map API server.
///
/// Loading failures are fatal: no listener is started. This is a regular
/// async function; the caller provides the runtime (e.g. via
/// `#[actix_web::main]`).
///
/// # Errors
///
/// Returns [`ServerError`] if the datasets cannot be loaded or the HTTP
/// server fails to bind or run.
#[allow(clippy::future_not_send)]
pub async fn run_server(config: AppConfig) -> Result<(), ServerError> {
    log::info!("Loading datasets...");
    let session = load_session(&config).await?;

    let state = web::Data::new(AppState::new(session, config.map.clone()));
    let bind_addr = config.server.bind_addr;
    let port = config.server.port;

    log::info!("Starting server on {bind_addr}:{port}");

    HttpServer::new(move || {
        let cors = Cors::permissive();

        App::new()
            .wrap(cors)
            .wrap(middleware::Logger::default())
            .app_data(state.clone())
            .configure(configure)
    })
    .bind((bind_addr, port))?
    .run()
    .await?;

    Ok(())
}
