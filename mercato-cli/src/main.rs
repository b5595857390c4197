mod cli;
mod operations;

use clap::Parser;
use mercato_ledger::{LedgerConfig, Marketplace};
use tracing::{debug, info};
use tracing_subscriber::prelude::*;

use cli::Cli;

fn load_config(cli: &Cli) -> Result<LedgerConfig, Box<dyn std::error::Error>> {
    let mut config = match &cli.config {
        Some(path) => LedgerConfig::load_from_file(path)?,
        None => LedgerConfig::default(),
    };
    if let Some(dir) = &cli.data_dir {
        config.data_dir = dir.clone();
    }
    debug!("Using data directory {}", config.data_dir.display());
    Ok(config)
}

fn main() {
    let cli = Cli::parse();

    let stderr_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,mercato_ledger=debug".into()),
        );
    tracing_subscriber::registry().with(stderr_layer).init();

    let result = load_config(&cli)
        .and_then(|config| Ok(Marketplace::open(config)?))
        .and_then(|mut market| {
            info!("Marketplace ready with {} products", market.products().len());
            for warning in market.load_warnings() {
                eprintln!("⚠️ Recovered from corrupt data: {}", warning);
            }
            operations::run(&mut market, cli.command)
        });

    match result {
        Ok(output) => println!("{}", output),
        Err(e) => {
            eprintln!("❌ {}", e);
            std::process::exit(1);
        }
    }
}
