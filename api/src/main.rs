//! staticpost API server
//!
//! Persists form submissions from static sites as files committed to a
//! user-owned GitHub/GitLab repository - directly, or through a review
//! request when the site wants moderation - and notifies thread
//! subscribers by email when a new reply lands.
//! Uses hexagonal (ports & adapters) architecture for clean separation of
//! concerns.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod adapters;
mod app;
mod config;
mod domain;
mod error;
mod handlers;

#[cfg(test)]
mod test_utils;


use adapters::MailgunClient;
use app::SubscriptionService;
use config::Config;

/// Application state shared across all handlers
///
/// Hosting clients are deliberately absent: one is constructed per request
/// around that request's credential and dropped afterwards. Only the mail
/// side is process-wide.
#[derive(Clone)]
pub struct AppState {
    pub subscriptions: Arc<SubscriptionService<MailgunClient>>,
    pub config: Config,
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,staticpost_api=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting staticpost API...");

    // Load configuration
    let config = Config::from_env();

    // The mail adapter is the only long-lived external client
    let mail = Arc::new(MailgunClient::new(
        config.mailgun_api_url.clone(),
        config.mailgun_api_key.clone(),
        config.mailgun_domain.clone(),
    ));

    let subscriptions = Arc::new(SubscriptionService::new(
        mail,
        config.email_from_address.clone(),
    ));

    let state = AppState {
        subscriptions,
        config,
    };

    // Build router
    let app = Router::new()
        // Health check (no auth)
        .route("/health", get(health))
        // Webhooks (no auth, uses signature verification)
        .route("/v1/webhook/:service", post(handlers::review_webhook))
        // Submission pipeline entry point
        .route(
            "/v1/entry/:service/:username/:repository/:branch/:property",
            post(handlers::create_entry),
        )
        // Repository connection (invitation acceptance)
        .route(
            "/v1/connect/:service/:username/:repository",
            get(handlers::connect),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    // Start server
    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(8080);
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await.unwrap();
    axum::serve(listener, app).await.unwrap();
}
