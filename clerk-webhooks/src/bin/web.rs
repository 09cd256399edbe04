//! Clerk webhook receiver.
//!
//! This binary:
//! - Receives Clerk webhooks delivered through Svix
//! - Verifies the signature against `WEBHOOK_SECRET`
//! - Logs user, session and organization lifecycle events
//!
//! Anything without a handler is answered with 404, which Clerk treats as
//! "not interested".

use std::net::SocketAddr;

use anyhow::{Context, Result};
use tokio::{net::TcpListener, signal};
use tracing::info;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use clerk_webhooks::events::{DeletedObjectJson, OrganizationJson, SessionJson, UserJson};
use clerk_webhooks::{web, Config, HandlerResult, WebhookConfig, WebhooksHandler};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize structured JSON logging
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().json().flatten_event(true))
        .init();

    info!("web_server_starting");

    // Load configuration
    let config = Config::from_env();
    info!(
        port = config.port,
        webhook_path = %config.webhook_path,
        webhook_secret_configured = config.webhook_secret.is_some(),
        tolerance_secs = config.tolerance_secs,
        handler_errors = ?config.handler_errors,
        "config_loaded"
    );

    // A missing or malformed secret stops startup here
    let webhooks = WebhooksHandler::new(register_handlers(config.webhook_config()))
        .context("Failed to configure webhook handler")?;

    let app = web::router(&config.webhook_path, webhooks);

    // Bind to address
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;

    info!(address = %addr, "web_server_listening");

    // Run server with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("web_server_shutdown_complete");

    Ok(())
}

fn register_handlers(config: WebhookConfig) -> WebhookConfig {
    config
        .on_user_created(user_changed)
        .on_user_updated(user_changed)
        .on_user_deleted(object_deleted)
        .on_session_created(session_changed)
        .on_session_ended(session_changed)
        .on_session_revoked(session_changed)
        .on_organization_created(organization_changed)
        .on_organization_updated(organization_changed)
        .on_organization_deleted(object_deleted)
}

async fn user_changed(user: UserJson) -> HandlerResult {
    info!(
        user_id = %user.id,
        primary_email = ?user.primary_email(),
        updated_at = ?user.updated_at,
        "user_changed"
    );
    Ok(None)
}

async fn session_changed(session: SessionJson) -> HandlerResult {
    info!(
        session_id = %session.id,
        user_id = ?session.user_id,
        status = ?session.status,
        "session_changed"
    );
    Ok(None)
}

async fn organization_changed(organization: OrganizationJson) -> HandlerResult {
    info!(
        organization_id = %organization.id,
        slug = ?organization.slug,
        members_count = ?organization.members_count,
        "organization_changed"
    );
    Ok(None)
}

async fn object_deleted(deleted: DeletedObjectJson) -> HandlerResult {
    info!(
        object = ?deleted.object,
        id = ?deleted.id,
        "object_deleted"
    );
    Ok(None)
}

/// Create a future that completes when a shutdown signal is received.
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received SIGINT"),
        _ = terminate => info!("Received SIGTERM"),
    }

    info!("web_server_shutting_down");
}
