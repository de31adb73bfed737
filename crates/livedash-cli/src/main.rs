//! CLI for livedash: live telemetry charts in the terminal.

mod commands;
mod tui;

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(name = "livedash")]
#[command(about = "livedash: live telemetry charts from a self-describing metric source")]
#[command(version = livedash_core::VERSION)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Where to poll and how to talk to the source.
#[derive(Args, Debug, Clone, Default)]
pub struct SourceArgs {
    /// TOML config file (base_url, poll_path, mutate_path, operation, ...)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Base URL of the metric source, e.g. http://127.0.0.1:8000
    #[arg(long)]
    url: Option<String>,

    /// Server dialect preset: add (5s polling) or modify (3s polling)
    #[arg(long, value_parser = ["add", "modify"])]
    dialect: Option<String>,

    /// Mutation operation tag sent with every change
    #[arg(long)]
    operation: Option<String>,

    /// Auto-poll interval in seconds
    #[arg(long)]
    interval: Option<u64>,
}

#[derive(Subcommand)]
enum Commands {
    /// Live dashboard (TUI)
    Monitor {
        #[command(flatten)]
        source: SourceArgs,

        /// Initial polling mode
        #[arg(long, default_value = "manual", value_parser = ["manual", "active", "passive"])]
        mode: String,

        /// Write logs here; the terminal is owned by the dashboard
        #[arg(long)]
        log_file: Option<PathBuf>,
    },

    /// Poll once and print what each slot would show
    Fetch {
        #[command(flatten)]
        source: SourceArgs,

        /// Print the computed layout as JSON
        #[arg(long)]
        json: bool,
    },

    /// Change a modifiable metric on the source
    Mutate {
        #[command(flatten)]
        source: SourceArgs,

        /// Metric name or its dropdown label (e.g. fanSpeed or "Fan Speed")
        #[arg(long)]
        metric: String,

        /// New value or delta, depending on the operation
        #[arg(long, allow_hyphen_values = true)]
        value: String,
    },

    /// Run the demo metric source
    Serve {
        /// Port to listen on
        #[arg(long, default_value = "8000")]
        port: u16,

        /// Host to bind to
        #[arg(long, default_value = "127.0.0.1")]
        host: String,
    },
}

fn main() {
    let cli = Cli::parse();

    match cli.command {
        Commands::Monitor {
            source,
            mode,
            log_file,
        } => commands::monitor::run(&source, &mode, log_file.as_deref()),
        Commands::Fetch { source, json } => commands::fetch::run(&source, json),
        Commands::Mutate {
            source,
            metric,
            value,
        } => commands::mutate::run(&source, &metric, &value),
        Commands::Serve { port, host } => commands::serve::run(&host, port),
    }
}
