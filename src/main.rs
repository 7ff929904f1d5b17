//! Conclave CLI entry point.

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use conclave::cli::{Cli, Commands};

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Run(args) => conclave::cli::commands::run::execute(args, cli.json).await,
        Commands::Validate(args) => {
            conclave::cli::commands::validate::execute(args, cli.json).await
        }
    };

    if let Err(err) = result {
        conclave::cli::handle_error(err, cli.json);
    }
}
