//! ABD CLI: simulation, benchmarking, and config validation.

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "abd")]
#[command(version, about = "Affine body dynamics simulator")]
struct Cli {
    /// Log every simulation event through `tracing` (set RUST_LOG=debug to see them).
    #[arg(long, global = true)]
    trace_events: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a procedural scene for a number of steps.
    Simulate {
        /// Scene to run (two_spheres, box_drop, sphere_pile).
        #[arg(short, long, default_value = "two_spheres")]
        scenario: String,

        /// Optional simulation config (TOML) replacing the scene's defaults.
        #[arg(short, long)]
        config: Option<String>,

        /// Number of steps; defaults to the scene's own count.
        #[arg(short = 'n', long)]
        steps: Option<u32>,

        /// Material preset applied to every free body.
        #[arg(short, long)]
        material: Option<String>,

        /// Write step reports and final poses as JSON.
        #[arg(short, long)]
        output: Option<String>,
    },

    /// Run benchmark suite.
    Benchmark {
        /// Which scenario to run (two_spheres, box_drop, sphere_pile, all).
        #[arg(short, long, default_value = "all")]
        scenario: String,

        /// Material preset applied to every free body.
        #[arg(short, long)]
        material: Option<String>,

        /// Output CSV file path.
        #[arg(short, long)]
        output: Option<String>,
    },

    /// List the material presets.
    Materials,

    /// Validate a simulation config file.
    Validate {
        /// Path to config file (TOML).
        path: String,
    },
}

fn init_tracing() {
    let subscriber = tracing_subscriber::FmtSubscriber::builder()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .finish();

    if tracing::subscriber::set_global_default(subscriber).is_err() {
        eprintln!("tracing subscriber already set");
    }
}

fn main() {
    init_tracing();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Simulate {
            scenario,
            config,
            steps,
            material,
            output,
        } => commands::simulate(commands::SimulateArgs {
            scenario: &scenario,
            config: config.as_deref(),
            steps,
            material: material.as_deref(),
            output: output.as_deref(),
            trace_events: cli.trace_events,
        }),
        Commands::Benchmark {
            scenario,
            material,
            output,
        } => commands::benchmark(&scenario, material.as_deref(), output.as_deref()),
        Commands::Materials => commands::materials(),
        Commands::Validate { path } => commands::validate(&path),
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
