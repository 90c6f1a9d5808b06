use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "medalroom", version, about = "Medalroom CLI")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Medal collection
    Medals {
        #[command(subcommand)]
        action: commands::medals::MedalsAction,
    },
    /// Points engine control
    Engine {
        #[command(subcommand)]
        action: commands::engine::EngineAction,
    },
    /// Register one avatar tap (five quick taps reset all progress)
    Tap,
    /// Reset all progress and stop the engine
    Reset,
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
}

fn main() {
    let cli = Cli::parse();

    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    let result = match cli.command {
        Commands::Medals { action } => commands::medals::run(action),
        Commands::Engine { action } => commands::engine::run(action),
        Commands::Tap => commands::tap::run_tap(),
        Commands::Reset => commands::tap::run_reset(),
        Commands::Config { action } => commands::config::run(action),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
