//! HTTP server for the nuyou site backend.
//!
//! This crate provides the axum server behind the site, serving:
//! - Content API: page documents and admin saves
//! - Admin image uploads
//! - Contact form submissions with email delivery
//! - Uploaded images and, optionally, the static site itself
//!
//! # Quick Start
//!
//! ```ignore
//! use nuyou_config::Config;
//! use nuyou_server::{run_server, server_config_from_config};
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = Config::load(None, None).unwrap();
//!     run_server(server_config_from_config(&config)).await.unwrap();
//! }
//! ```
//!
//! # Architecture
//!
//! ```text
//! Browser ──HTTP──► axum server (nuyou-server)
//!                        │
//!                        ├─► session middleware (cookie, ?admin= / ?logout=)
//!                        │
//!                        ├─► /api/content, /api/admin/save ──► ContentStore
//!                        ├─► /api/admin/upload ──────────────► ImageUploads
//!                        ├─► /api/contact ──► RateLimiter ──► EmailService (blocking pool)
//!                        │
//!                        └─► Static files (uploads, public dir)
//! ```

mod admin;
mod app;
mod error;
mod handlers;
mod middleware;
mod rate_limit;
mod session;
mod state;
mod static_files;

use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;

use axum::Router;
use nuyou_config::{Config, EmailConfig};
use nuyou_content::ContentStore;
use nuyou_mail::{ContactSettings, EmailService};
use nuyou_media::ImageUploads;
use state::{AppState, ContactMessages};

/// Server configuration.
#[derive(Clone)]
pub struct ServerConfig {
    /// Host address to bind to.
    pub host: String,
    /// Port to listen on.
    pub port: u16,
    /// Directory holding page documents.
    pub content_dir: PathBuf,
    /// Directory uploads are written to.
    pub upload_dir: PathBuf,
    /// URL prefix uploads are served under.
    pub upload_url_prefix: String,
    /// Static site served for non-API paths.
    pub public_dir: Option<PathBuf>,
    /// Admin secret (`None` disables admin mode).
    pub admin_secret: Option<String>,
    /// Contact submissions allowed per address per hour.
    pub max_submissions_per_hour: u32,
    /// Contact notification routing.
    pub contact: ContactSettings,
    /// Message returned after a delivered submission.
    pub success_message: String,
    /// Message returned when delivery fails.
    pub error_message: String,
    /// Email transports.
    pub email: EmailConfig,
}

impl std::fmt::Debug for ServerConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServerConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("content_dir", &self.content_dir)
            .field("upload_dir", &self.upload_dir)
            .field("upload_url_prefix", &self.upload_url_prefix)
            .field("public_dir", &self.public_dir)
            .field("admin_secret", &self.admin_secret.as_ref().map(|_| "<redacted>"))
            .field("max_submissions_per_hour", &self.max_submissions_per_hour)
            .field("contact", &self.contact)
            .field("email", &self.email)
            .finish_non_exhaustive()
    }
}

/// Run the server.
///
/// # Errors
///
/// Returns an error if the address is invalid or the listener fails.
pub async fn run_server(config: ServerConfig) -> Result<(), Box<dyn std::error::Error>> {
    let mail = EmailService::from_config(&config.email);
    match mail.primary_name() {
        Some(primary) => tracing::info!(primary, fallback = config.email.fallback, "Email configured"),
        None => tracing::info!("Email configured for local delivery only"),
    }

    let app = create_app(&config, mail);

    let addr = SocketAddr::from_str(&format!("{}:{}", config.host, config.port))?;
    tracing::info!(address = %addr, "Starting server");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    Ok(())
}

/// Build the router with the given mail service.
pub fn create_app(config: &ServerConfig, mail: EmailService) -> Router {
    let admin = admin::AdminGate::new(config.admin_secret.as_deref());
    if !admin.enabled() {
        tracing::warn!("No admin secret configured, admin mode is disabled");
    }

    let state = Arc::new(AppState {
        content: ContentStore::new(config.content_dir.clone()),
        uploads: ImageUploads::new(config.upload_dir.clone(), &config.upload_url_prefix),
        admin,
        sessions: session::SessionStore::new(session::SESSION_TTL, session::MAX_SESSIONS),
        limiter: rate_limit::RateLimiter::new(
            usize::try_from(config.max_submissions_per_hour).unwrap_or(usize::MAX),
            rate_limit::WINDOW,
        ),
        mail: Arc::new(mail),
        contact: config.contact.clone(),
        messages: ContactMessages {
            success: config.success_message.clone(),
            error: config.error_message.clone(),
        },
        public_dir: config.public_dir.clone(),
    });

    app::create_router(state)
}

/// Wait for shutdown signal (Ctrl-C).
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for Ctrl-C");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received, stopping server...");
}

/// Create server configuration from the loaded application config.
#[must_use]
pub fn server_config_from_config(config: &Config) -> ServerConfig {
    ServerConfig {
        host: config.server.host.clone(),
        port: config.server.port,
        content_dir: config.paths.content_dir.clone(),
        upload_dir: config.paths.upload_dir.clone(),
        upload_url_prefix: config.paths.upload_url_prefix.clone(),
        public_dir: config.paths.public_dir.clone(),
        admin_secret: config.admin.secret_key.clone(),
        max_submissions_per_hour: config.contact.max_submissions_per_hour,
        contact: ContactSettings {
            to: config.contact.to_email.clone(),
            bcc: config.contact.bcc.clone(),
            site_name: config.site.name.clone(),
            site_phone: config.site.phone.clone(),
        },
        success_message: config.contact.success_message.clone(),
        error_message: config.contact.error_message.clone(),
        email: config.email.clone(),
    }
}
