//! Documentation of a patient health-metrics web application.
//!
//!
//!
//! # General Infrastructure
//! - Visitors talk to a single axum server that renders every page itself
//! - Identity, records, email and audit logging are hosted services reached over HTTP
//! - Each hosted service sits behind a trait, `VITALS_BACKEND=memory` swaps in local stand-ins
//! - Nothing is persisted by the server, a restart only forgets open shells
//!
//!
//!
//! # Shells
//!
//! **Goal**: Keep the interaction model of a single-page app while rendering on the server.
//!
//! - The first screen or menu request without a known `vitals_sid` cookie creates a shell
//! - Landing, About and 404 pages only read an existing shell, they never create one
//! - A shell holds the visitor's session plus one instance of every stateful screen
//! - `GET` on a screen route mounts the screen fresh, `POST` routes act on the mounted one
//! - One submission per screen at a time, a second one gets `409 Conflict`
//! - Idle shells are swept after `SHELL_IDLE_SECS`
//!
//!
//!
//! # Notes
//!
//! ## Registration
//! Creating the login and writing the record are two calls to two services. When the record
//! write fails the fresh login is deleted again, so a visitor never keeps a login without a
//! record. If that deletion fails too the audit relay is told the account needs manual repair.
//!
//! ## PRN uniqueness
//! The PRN is the storage key. Registering the same PRN twice overwrites the first record.
//!
//!
//!
//! # Setup
//!
//! View current docs.
//! ```sh
//! cargo doc --open
//! `````
//!
//! Run locally with in-memory collaborators.
//! ```sh
//! RUST_LOG=info cargo run -p vitals
//! ```
//!
//! Run against the hosted services.
//! ```sh
//! VITALS_BACKEND=remote RECORDS_ENDPOINT=https://example.firebaseio.com \
//!     IDENTITY_API_KEY=... NOTIFY_PUBLIC_KEY=... NOTIFY_TEMPLATE_ID=... \
//!     AUDIT_ENDPOINT=https://logs.example.org cargo run -p vitals
//! ```
use std::{sync::Arc, time::Duration};

use axum::{
    Router,
    http::{Method, header::CONTENT_TYPE},
    routing::{get, post},
};

use signal::{
    ctrl_c,
    unix::{SignalKind, signal},
};
use tokio::{net::TcpListener, signal};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, fmt};

pub mod config;
pub mod error;
pub mod fakes;
pub mod identity;
pub mod pages;
pub mod relay;
pub mod report;
pub mod routes;
pub mod screens;
pub mod session;
pub mod shell;
pub mod state;
pub mod utils;

use config::Config;
use error::StartupError;
use routes::{
    about_handler, contact_handler, contact_page_handler, dashboard_page_handler,
    fallback_handler, history_handler, landing_handler, login_handler, login_page_handler,
    logout_handler, menu_handler, register_handler, register_page_handler, report_handler,
    validate_handler, verify_handler,
};
use shell::sweep_idle;
use state::AppState;

pub fn build_router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE])
        .max_age(Duration::from_secs(60 * 60));

    Router::new()
        .route("/", get(landing_handler))
        .route("/about", get(about_handler))
        .route("/register", get(register_page_handler).post(register_handler))
        .route("/register/validate", post(validate_handler))
        .route("/login", get(login_page_handler).post(login_handler))
        .route("/dashboard", get(dashboard_page_handler).post(verify_handler))
        .route("/dashboard/history", post(history_handler))
        .route("/dashboard/report", get(report_handler))
        .route("/contact", get(contact_page_handler).post(contact_handler))
        .route("/logout", post(logout_handler))
        .route("/menu", post(menu_handler))
        .fallback(fallback_handler)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

pub async fn start_server() -> Result<(), StartupError> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();

    info!("Loading config...");
    let config = Config::load().inspect_err(|e| error!(error = %e, "Invalid configuration"))?;

    info!("Initializing state...");
    let state = AppState::new(config)?;

    tokio::spawn(sweep_idle(state.clone()));

    info!("Starting server...");
    let app = build_router(state.clone());

    let address = format!("0.0.0.0:{}", state.config.port);
    info!("Binding to {address}");

    let listener = TcpListener::bind(&address).await?;
    info!("Server running on {address}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shut down");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
            return std::future::pending().await;
        }

        info!("Received Ctrl+C, shutting down");
    };

    #[cfg(unix)]
    let terminate = async {
        match signal(SignalKind::terminate()) {
            Ok(mut terminate) => {
                terminate.recv().await;
                info!("Received terminate signal, shutting down");
            }
            Err(e) => {
                error!(error = %e, "Failed to install signal handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
