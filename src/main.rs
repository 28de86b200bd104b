use cascadeflow::config;
use cascadeflow::core::queue::Null;
use cascadeflow::core::stage::Stage;
use cascadeflow::logging;
use cascadeflow::stages::registry;
use clap::Parser;
use std::sync::Arc;

/// cascadeflow: a framework for building branching event processing
/// pipelines from a TOML configuration file.
#[derive(Parser)]
#[command(name = "cascadeflow")]
#[command(author = "Keith Bugeja <keith.bugeja@um.edu.mt>")]
#[command(version = "0.1.0")]
#[command(about = "A framework for building branching event processing pipelines")]
struct Cli {
    /// Configuration file path
    #[arg(short, long, default_value = "./config/config.toml")]
    config: String,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// List registered stage types and exit
    #[arg(short = 'L', long)]
    list_stages: bool,
}

#[tokio::main(flavor = "multi_thread", worker_threads = 32)]
async fn main() {
    let cli = Cli::parse();
    logging::init_logging(&cli.log_level);

    if cli.list_stages {
        println!("Registered stage types:");
        for stage_type in registry::list() {
            println!("  - {stage_type}");
        }
        return;
    }

    let parsed_config = match config::load_config(&cli.config) {
        Ok(cfg) => cfg,
        Err(e) => {
            tracing::error!("failed to load config from '{}': {e}", cli.config);
            std::process::exit(1);
        }
    };

    if let Err(e) = config::validate_config(&parsed_config) {
        tracing::error!("configuration error: {e}");
        std::process::exit(1);
    }
    tracing::info!("configuration '{}' loaded and validated", parsed_config.name);

    let mut pipeline = match registry::build(&parsed_config) {
        Ok(pipeline) => pipeline,
        Err(e) => {
            tracing::error!("failed to build pipeline: {e}");
            std::process::exit(1);
        }
    };

    pipeline.setup(Arc::new(Null));
    if let Err(e) = pipeline.start().await {
        tracing::error!("failed to start pipeline: {e}");
        std::process::exit(1);
    }
    tracing::info!("pipeline '{}' running, press Ctrl-C to stop", parsed_config.name);

    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("failed to listen for shutdown signal: {e}");
    }

    tracing::info!("shutting down");
    if let Err(e) = pipeline.stop().await {
        tracing::error!("error while stopping pipeline: {e}");
    }
}
