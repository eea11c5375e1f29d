//! CLI for resmon — live RAM / CPU / frame-rate cards in your terminal.

mod commands;
mod tui;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "resmon")]
#[command(about = "resmon — live RAM / CPU / frame-rate cards in your terminal")]
#[command(version = resmon_core::VERSION)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Live card dashboard (TUI)
    Monitor {
        /// Redraw pacing in seconds (the draw loop is what the FPS card measures)
        #[arg(long, default_value = "0.1")]
        refresh: f64,

        /// Spin-workload iterations per CPU measurement window
        #[arg(long, default_value_t = resmon_core::DEFAULT_SPIN_ITERATIONS)]
        spin_iterations: u64,
    },

    /// Sample every metric once and print it
    Snapshot {
        /// Emit pretty JSON instead of card lines
        #[arg(long)]
        json: bool,

        /// Spin-workload iterations for the CPU measurement window
        #[arg(long, default_value_t = resmon_core::DEFAULT_SPIN_ITERATIONS)]
        spin_iterations: u64,
    },

    /// Print one line of metrics per interval until stopped
    Watch {
        /// Sampling interval in milliseconds
        #[arg(long, default_value = "500")]
        interval_ms: u64,

        /// Number of lines to print (0 = until Ctrl-C)
        #[arg(long, default_value = "0")]
        count: u64,

        /// Spin-workload iterations per CPU measurement window
        #[arg(long, default_value_t = resmon_core::DEFAULT_SPIN_ITERATIONS)]
        spin_iterations: u64,
    },
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Monitor {
            refresh,
            spin_iterations,
        } => commands::monitor::run(refresh, spin_iterations),
        Commands::Snapshot {
            json,
            spin_iterations,
        } => commands::snapshot::run(json, spin_iterations),
        Commands::Watch {
            interval_ms,
            count,
            spin_iterations,
        } => commands::watch::run(interval_ms, count, spin_iterations),
    }
}
