//! VQLS Command-Line Interface
//!
//! Loads a run configuration, minimizes the VQLS cost on the local
//! statevector oracle and reports the trajectory.
//!
//! ```text
//! vqls inspect -c problem.yaml
//! vqls run -c problem.yaml -o report.json -vv
//! ```

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

use clap::{Parser, Subcommand};
use console::style;
use tracing_subscriber::EnvFilter;

mod commands;

use commands::{inspect, run};

/// Variational quantum linear solver
#[derive(Parser)]
#[command(name = "vqls")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the optimizer on a problem
    Run {
        /// Run configuration (YAML or JSON)
        #[arg(short, long)]
        config: String,

        /// Write the JSON report to this file
        #[arg(short, long)]
        output: Option<String>,

        /// Print the JSON report to stdout instead of the summary
        #[arg(long)]
        json: bool,

        /// Hide the progress bar
        #[arg(long)]
        no_progress: bool,
    },

    /// Show the parsed operator, A†A and ansatz without running
    Inspect {
        /// Run configuration (YAML or JSON)
        #[arg(short, long)]
        config: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let result = match cli.command {
        Commands::Run {
            config,
            output,
            json,
            no_progress,
        } => run::execute(&config, output.as_deref(), json, !no_progress).await,

        Commands::Inspect { config } => inspect::execute(&config),
    };

    if let Err(e) = result {
        eprintln!("{} {:#}", style("Error:").red().bold(), e);
        std::process::exit(1);
    }

    Ok(())
}
