//! nuyou CLI - coming-soon site backend.
//!
//! Provides commands for:
//! - `serve`: Start the HTTP server
//! - `content show|set|list`: Inspect and edit page documents
//! - `config check`: Validate configuration and print a summary

mod commands;
mod error;
mod logging;
mod output;

use clap::{Parser, Subcommand};

use commands::{ConfigCommand, ContentCommand, ServeArgs};
use logging::Logging;
use output::Output;

/// nuyou - coming-soon site backend with inline content editing.
#[derive(Parser)]
#[command(name = "nuyou", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP server.
    Serve(ServeArgs),
    /// Inspect and edit page content.
    #[command(subcommand)]
    Content(ContentCommand),
    /// Configuration commands.
    #[command(subcommand)]
    Config(ConfigCommand),
}

fn main() {
    let cli = Cli::parse();
    let output = Output::new();

    // Server logs at info by default; one-shot commands only surface problems
    let logging = match &cli.command {
        Commands::Serve(args) => Logging::init(args.verbose, "info"),
        _ => Logging::init(false, "warn"),
    };

    let result = match cli.command {
        Commands::Serve(args) => match tokio::runtime::Runtime::new() {
            Ok(rt) => rt.block_on(args.execute(&logging)),
            Err(e) => Err(e.into()),
        },
        Commands::Content(cmd) => cmd.execute(),
        Commands::Config(cmd) => cmd.execute(),
    };

    if let Err(err) = result {
        output.error(&format!("Error: {err}"));
        std::process::exit(1);
    }
}
