use super::naming;
use crate::config::{AppConfig, BlobNaming, Credentials, EnvLookup};
use crate::database::{is_system_database, DatabaseConnector, DatabaseSession};
use crate::error::Result;
use crate::upload::StorageConnector;
use crate::web::{AppState, BackupEntry};
use chrono::{DateTime, Utc};
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, warn};

/// Everything a backup invocation needs besides the connection strings,
/// which are looked up through `env` at the start of every run.
pub struct BackupContext {
    pub config: AppConfig,
    pub databases: Arc<dyn DatabaseConnector>,
    pub storage: Arc<dyn StorageConnector>,
    pub env: EnvLookup,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BackupKind {
    /// The configured `active_databases` list.
    Active,
    /// Every database returned by the server listing.
    All,
}

impl std::fmt::Display for BackupKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BackupKind::Active => write!(f, "active-databases"),
            BackupKind::All => write!(f, "all-databases"),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct UploadedBlob {
    pub database: String,
    pub blob_name: String,
    pub size: u64,
    pub sha256: String,
}

#[derive(Debug)]
pub struct BackupReport {
    pub kind: BackupKind,
    /// Invocation time; every blob name of the run embeds it.
    pub timestamp: DateTime<Utc>,
    pub uploaded: Vec<UploadedBlob>,
}

pub async fn backup_active(ctx: &BackupContext) -> Result<BackupReport> {
    let (report, outcome) = backup(ctx, BackupKind::Active).await;
    outcome.map(|_| report)
}

pub async fn backup_all(ctx: &BackupContext) -> Result<BackupReport> {
    let (report, outcome) = backup(ctx, BackupKind::All).await;
    outcome.map(|_| report)
}

/// Runs one procedure and always hands back what was uploaded, even on failure.
pub async fn backup(ctx: &BackupContext, kind: BackupKind) -> (BackupReport, Result<()>) {
    let mut report = BackupReport {
        kind,
        timestamp: Utc::now(),
        uploaded: Vec::new(),
    };
    let outcome = run_backup(ctx, &mut report).await;
    (report, outcome)
}

/// Trigger boundary: runs the procedure, logs the outcome and records it in `state`.
pub async fn execute(state: &AppState, trigger: &str, kind: BackupKind) -> Result<BackupReport> {
    let start = Instant::now();
    info!("{} trigger started {} backup", trigger, kind);

    let (report, outcome) = backup(&state.context, kind).await;
    let duration_secs = start.elapsed().as_secs();

    match &outcome {
        Ok(()) => info!(
            "{} backup completed: {} database(s) in {} sec",
            kind,
            report.uploaded.len(),
            duration_secs
        ),
        Err(e) => error!(
            "{} backup failed after {} upload(s): {}",
            kind,
            report.uploaded.len(),
            e
        ),
    }

    state
        .add_backup_entry(BackupEntry {
            timestamp: report.timestamp,
            trigger: trigger.to_string(),
            kind,
            success: outcome.is_ok(),
            blobs: report.uploaded.clone(),
            duration_secs,
            error: outcome.as_ref().err().map(|e| e.to_string()),
        })
        .await;

    outcome.map(|_| report)
}

/// Databases the all-databases backup would export right now.
pub async fn list_databases(ctx: &BackupContext) -> Result<Vec<String>> {
    let credentials = Credentials::from_lookup(ctx.env)?;
    let mut session = ctx.databases.connect(&credentials.database).await?;
    let listed = discover_databases(&ctx.config, session.as_mut()).await;
    close_session(ctx, session).await;
    listed
}

async fn run_backup(ctx: &BackupContext, report: &mut BackupReport) -> Result<()> {
    let credentials = Credentials::from_lookup(ctx.env)?;
    let mut session = ctx.databases.connect(&credentials.database).await?;
    let outcome = export_targets(ctx, session.as_mut(), &credentials, report).await;
    close_session(ctx, session).await;
    outcome
}

async fn close_session(ctx: &BackupContext, session: Box<dyn DatabaseSession>) {
    if let Err(e) = session.close().await {
        warn!("Failed to close {} connection: {}", ctx.databases.engine_name(), e);
    }
}

async fn export_targets(
    ctx: &BackupContext,
    session: &mut dyn DatabaseSession,
    credentials: &Credentials,
    report: &mut BackupReport,
) -> Result<()> {
    let (targets, naming) = match report.kind {
        BackupKind::Active => (ctx.config.active_databases.clone(), BlobNaming::PerDatabase),
        BackupKind::All => (
            discover_databases(&ctx.config, session).await?,
            ctx.config.all_databases.naming,
        ),
    };

    if targets.is_empty() {
        warn!("No databases to back up for {} backup", report.kind);
        return Ok(());
    }
    if naming == BlobNaming::TimestampOnly && targets.len() > 1 {
        warn!(
            "Timestamp-only blob naming: {} databases will share one blob name",
            targets.len()
        );
    }

    let uploader = ctx
        .storage
        .connect(&credentials.storage, &ctx.config.container)
        .await?;

    for db_name in &targets {
        debug!("Switching to database: {}", db_name);
        session.use_database(db_name).await?;
        let dump = session.export(db_name).await?;

        let blob = UploadedBlob {
            database: db_name.clone(),
            blob_name: naming::blob_name(naming, db_name, report.timestamp),
            size: dump.len() as u64,
            sha256: format!("{:x}", Sha256::digest(&dump)),
        };
        uploader.upload(&blob.blob_name, dump).await?;

        info!(
            "Backed up {} to {} as {} ({:.2} MB)",
            db_name,
            uploader.name(),
            blob.blob_name,
            blob.size as f64 / 1024.0 / 1024.0
        );
        report.uploaded.push(blob);
    }

    Ok(())
}

async fn discover_databases(config: &AppConfig, session: &mut dyn DatabaseSession) -> Result<Vec<String>> {
    let listed = session.list_databases().await?;
    if !config.all_databases.exclude_system {
        return Ok(listed);
    }

    let (system, user): (Vec<String>, Vec<String>) =
        listed.into_iter().partition(|name| is_system_database(name));
    if !system.is_empty() {
        debug!("Skipping system databases: {}", system.join(", "));
    }
    Ok(user)
}
