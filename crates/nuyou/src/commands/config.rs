//! `nuyou config` command implementation.

use std::path::PathBuf;

use clap::Subcommand;
use nuyou_config::{Config, EmailBackend};

use crate::error::CliError;
use crate::output::Output;

/// Configuration subcommands.
#[derive(Subcommand)]
pub(crate) enum ConfigCommand {
    /// Validate configuration and print a summary.
    Check {
        /// Path to the environment file (default: auto-discover .env).
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}

impl ConfigCommand {
    /// Execute the config command.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be loaded or is invalid.
    pub(crate) fn execute(self) -> Result<(), CliError> {
        match self {
            Self::Check { config } => check(config),
        }
    }
}

fn check(config_path: Option<PathBuf>) -> Result<(), CliError> {
    let output = Output::new();
    let config = Config::load(config_path.as_deref(), None)?;

    match &config.config_path {
        Some(path) => output.highlight(&format!("Configuration: {}", path.display())),
        None => output.highlight("Configuration: defaults (no .env found)"),
    }

    output.field("Listen", &format!("{}:{}", config.server.host, config.server.port));
    output.field("Content", &config.paths.content_dir.display().to_string());
    output.field(
        "Uploads",
        &format!(
            "{} -> {}",
            config.paths.upload_url_prefix,
            config.paths.upload_dir.display()
        ),
    );
    output.field(
        "Public",
        &config
            .paths
            .public_dir
            .as_ref()
            .map_or_else(|| "not served".to_owned(), |p| p.display().to_string()),
    );
    output.field(
        "Admin mode",
        if config.admin.secret_key.is_some() {
            "enabled"
        } else {
            "disabled"
        },
    );
    output.field("Email", &email_summary(&config));
    output.field("Sender", &format!("{} <{}>", config.email.from_name, config.email.from_email));
    output.field("Contact", &config.contact.to_email);
    if !config.contact.bcc.is_empty() {
        output.field("Bcc", &config.contact.bcc.join(", "));
    }
    output.field(
        "Rate limit",
        &format!("{} per hour", config.contact.max_submissions_per_hour),
    );

    output.success("Configuration is valid");
    Ok(())
}

fn email_summary(config: &Config) -> String {
    let email = &config.email;
    match email.backend {
        EmailBackend::Mail => format!("local mail ({})", email.sendmail_path.display()),
        EmailBackend::SendGrid if !email.api_enabled() => {
            "local mail (SendGrid selected, no API key)".to_owned()
        }
        EmailBackend::SendGrid if email.fallback => "SendGrid, falling back to local mail".to_owned(),
        EmailBackend::SendGrid => "SendGrid".to_owned(),
    }
}
