//! `nuyou serve` command implementation.

use std::path::PathBuf;

use clap::Args;
use nuyou_config::{CliSettings, Config, EmailBackend};
use nuyou_server::{run_server, server_config_from_config};

use crate::error::CliError;
use crate::logging::Logging;
use crate::output::Output;

/// Arguments for the serve command.
#[derive(Args)]
pub(crate) struct ServeArgs {
    /// Path to the environment file (default: auto-discover .env).
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Content directory (overrides config).
    #[arg(long)]
    content_dir: Option<PathBuf>,

    /// Host to bind to (overrides config).
    #[arg(long)]
    host: Option<String>,

    /// Port to bind to (overrides config).
    #[arg(short, long)]
    port: Option<u16>,

    /// Enable debug logging.
    #[arg(short, long)]
    pub verbose: bool,
}

impl ServeArgs {
    /// Execute the serve command.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration fails or the server fails to start.
    pub(crate) async fn execute(self, logging: &Logging) -> Result<(), CliError> {
        let output = Output::new();

        let cli_settings = CliSettings {
            host: self.host,
            port: self.port,
            content_dir: self.content_dir,
            debug: self.verbose.then_some(true),
        };

        let config = Config::load(self.config.as_deref(), Some(&cli_settings))?;
        if config.debug {
            logging.enable_debug();
        }

        output.info(&format!(
            "Starting server on {}:{}",
            config.server.host, config.server.port
        ));
        output.info(&format!(
            "Content directory: {}",
            config.paths.content_dir.display()
        ));
        output.info(&format!(
            "Uploads: {} -> {}",
            config.paths.upload_url_prefix,
            config.paths.upload_dir.display()
        ));

        if let Some(public_dir) = &config.paths.public_dir {
            output.info(&format!("Public directory: {}", public_dir.display()));
        }

        if config.admin.secret_key.is_some() {
            output.info("Admin mode: enabled");
        } else {
            output.warning("Admin mode: disabled (ADMIN_SECRET_KEY not set)");
        }

        match (config.email.backend, config.email.api_enabled()) {
            (EmailBackend::SendGrid, true) if config.email.fallback => {
                output.info("Email: SendGrid with local fallback");
            }
            (EmailBackend::SendGrid, true) => output.info("Email: SendGrid"),
            (EmailBackend::SendGrid, false) => {
                output.warning("Email: SendGrid selected but no API key, using local mail");
            }
            (EmailBackend::Mail, _) => output.info("Email: local mail"),
        }

        run_server(server_config_from_config(&config))
            .await
            .map_err(|e| CliError::Server(e.to_string()))?;

        Ok(())
    }
}
