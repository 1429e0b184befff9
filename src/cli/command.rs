use super::args::{Cli, Commands, Target};
use crate::backup::{
    backup_active, backup_all, list_databases, run_timer, timer_triggers, BackupContext,
};
use crate::config::{self, process_env};
use crate::database::MysqlConnector;
use crate::error::{BackupError, Result};
use crate::upload::AzblobConnector;
use crate::web::{start_server, AppState};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tracing::{error, info};

pub async fn run(cli: Cli) -> Result<()> {
    let app_config = config::load(cli.config.as_deref(), process_env)?;
    info!(
        "{} active database(s), container '{}'",
        app_config.active_databases.len(),
        app_config.container
    );

    let ctx = BackupContext {
        config: app_config,
        databases: Arc::new(MysqlConnector),
        storage: Arc::new(AzblobConnector),
        env: process_env,
    };

    match cli.command.unwrap_or(Commands::Serve { port: None }) {
        Commands::Serve { port } => serve(ctx, port).await,
        Commands::Backup { target } => {
            let report = match target {
                Target::Active => backup_active(&ctx).await?,
                Target::All => backup_all(&ctx).await?,
            };
            for blob in &report.uploaded {
                println!("{}\t{} bytes\tsha256:{}", blob.blob_name, blob.size, blob.sha256);
            }
            println!(
                "Uploaded {} blob(s) to container '{}'",
                report.uploaded.len(),
                ctx.config.container
            );
            Ok(())
        }
        Commands::List => {
            for name in list_databases(&ctx).await? {
                println!("{}", name);
            }
            Ok(())
        }
        Commands::Config { write } => {
            print!("{}", toml::to_string_pretty(&ctx.config)?);
            if write {
                let path = cli.config.unwrap_or_else(config::config_path);
                config::save_to(&ctx.config, &path)?;
            }
            Ok(())
        }
    }
}

async fn serve(ctx: BackupContext, port: Option<u16>) -> Result<()> {
    let shutdown = Arc::new(AtomicUsize::new(0));
    let shutdown_handler = shutdown.clone();

    ctrlc::set_handler(move || {
        let count = shutdown_handler.fetch_add(1, Ordering::SeqCst);

        if count == 0 {
            println!("\n\nShutdown signal received. Press Ctrl+C again to force exit...");
        } else {
            println!("\nForce exiting...");
            std::process::exit(130);
        }
    })
    .map_err(|e| BackupError::Config(format!("failed to set Ctrl-C handler: {}", e)))?;

    let web = ctx.config.web.clone();
    let triggers = timer_triggers(&ctx.config);
    let state = AppState::new(ctx);

    let mut tasks = Vec::new();
    for trigger in triggers {
        tasks.push(tokio::spawn(run_timer(trigger, state.clone(), shutdown.clone())));
    }
    if web.enabled {
        let port = port.unwrap_or(web.port);
        tasks.push(tokio::spawn(start_server(state.clone(), port, shutdown.clone())));
    } else {
        info!("HTTP trigger disabled in configuration");
    }

    for result in futures::future::join_all(tasks).await {
        if let Err(e) = result {
            error!("Background task failed: {}", e);
        }
    }
    info!("All triggers stopped");
    Ok(())
}
