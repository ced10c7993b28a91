//! factorlsq CLI — solve, inspect, and validate least-squares problems.

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "factorlsq")]
#[command(version, about = "factorlsq — sparse linear least squares via QR or Cholesky")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Solve a problem file (JSON).
    Solve {
        /// Path to the problem file.
        problem: String,

        /// Factorization: qr or cholesky.
        #[arg(short, long)]
        method: Option<String>,

        /// Column ordering: NATURAL, AMD, COLAMD, or METIS.
        #[arg(long)]
        ordering: Option<String>,

        /// Solver config (TOML).
        #[arg(short, long)]
        config: Option<String>,

        /// Write the solution (JSON) here instead of stdout.
        #[arg(short, long)]
        output: Option<String>,

        /// Print the per-phase solve events.
        #[arg(long)]
        events: bool,
    },

    /// Show the shape and variables of a problem file.
    Inspect {
        /// Path to the problem file.
        path: String,
    },

    /// Validate a solver config (.toml) or problem file (.json).
    Validate {
        /// Path to the file.
        path: String,
    },
}

fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Solve {
            problem,
            method,
            ordering,
            config,
            output,
            events,
        } => commands::solve(&commands::SolveArgs {
            problem: &problem,
            method: method.as_deref(),
            ordering: ordering.as_deref(),
            config: config.as_deref(),
            output: output.as_deref(),
            events,
        }),
        Commands::Inspect { path } => commands::inspect(&path),
        Commands::Validate { path } => commands::validate(&path),
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
