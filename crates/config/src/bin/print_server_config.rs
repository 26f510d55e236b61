//! Print the resolved server config (process env) as JSON or TOML.
//!
//! Credentials are always redacted. Diagnostics go to stderr so stdout stays
//! machine-readable.

use chat_gateway_config::{
    BuildTarget, ConfigReport, EnvSnapshot, server_config, to_pretty_json, to_pretty_toml,
};
use clap::{Parser, ValueEnum};
use serde::Serialize;
use std::io;
use std::io::Write;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Output format for the resolved config.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    /// Pretty JSON.
    #[default]
    Json,
    /// Pretty TOML.
    Toml,
}

#[derive(Debug, Parser)]
#[command(
    name = "print-server-config",
    version,
    about = "Print the resolved chat-gateway server config",
    long_about = None
)]
struct Cli {
    /// Output format.
    #[arg(long, value_enum, default_value_t = OutputFormat::Json)]
    format: OutputFormat,

    /// Wrap the config as `{ availableModels, config }` with the models left
    /// available by the custom model rules.
    #[arg(long)]
    show_models: bool,
}

fn main() -> std::process::ExitCode {
    init_tracing();
    let cli = Cli::parse();

    match run(&cli) {
        Ok(()) => std::process::ExitCode::SUCCESS,
        Err(error) => {
            eprintln!("error: {error}");
            std::process::ExitCode::from(1)
        },
    }
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(io::stderr)
                .with_ansi(false),
        )
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();
}

fn run(cli: &Cli) -> Result<(), Box<dyn std::error::Error>> {
    if let Some(env) = EnvSnapshot::capture() {
        let target = BuildTarget::from_snapshot(&env);
        tracing::info!(mode = %target.mode, is_app = target.is_app, "build target");
    }

    let config = server_config()?;
    let output = if cli.show_models {
        render(cli.format, &ConfigReport::new(&config))?
    } else {
        render(cli.format, &config)?
    };

    let mut stdout = io::stdout();
    stdout.write_all(output.as_bytes())?;
    stdout.flush()?;

    Ok(())
}

fn render<T: Serialize>(format: OutputFormat, value: &T) -> chat_gateway_shared::Result<String> {
    match format {
        OutputFormat::Json => to_pretty_json(value),
        OutputFormat::Toml => to_pretty_toml(value),
    }
}
