mod backup;
mod cli;
mod config;
mod database;
mod error;
mod log;
mod upload;
mod web;

#[cfg(test)]
mod test_util;

use clap::Parser;
use tracing::info;

#[tokio::main]
async fn main() {
    log::init();

    let cli = cli::Cli::parse();
    info!("blob-sql-backup v{} starting...", env!("CARGO_PKG_VERSION"));

    match cli::run(cli).await {
        Ok(_) => {
            info!("Application exited normally");
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}
