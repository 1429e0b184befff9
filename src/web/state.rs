use crate::backup::{BackupContext, BackupKind, UploadedBlob};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::RwLock;

const HISTORY_LIMIT: usize = 50;

/// Timer metadata: informational only, never drives a run.
#[derive(Debug, Clone, Serialize)]
pub struct ScheduleStatus {

    pub name: String,

    pub schedule: String,

    pub last: Option<DateTime<Utc>>,

    pub next: Option<DateTime<Utc>>,

    pub last_updated: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct BackupEntry {

    pub timestamp: DateTime<Utc>,

    pub trigger: String,

    pub kind: BackupKind,

    pub success: bool,

    pub blobs: Vec<UploadedBlob>,

    pub duration_secs: u64,

    pub error: Option<String>,
}

pub struct AppState {

    pub context: BackupContext,

    pub schedules: RwLock<Vec<ScheduleStatus>>,

    pub history: RwLock<Vec<BackupEntry>>,
}

impl AppState {

    pub fn new(context: BackupContext) -> Arc<Self> {
        Arc::new(Self {
            context,
            schedules: RwLock::new(Vec::new()),
            history: RwLock::new(Vec::new()),
        })
    }

    pub async fn update_schedule(&self, status: ScheduleStatus) {
        let mut schedules = self.schedules.write().await;
        match schedules.iter_mut().find(|s| s.name == status.name) {
            Some(existing) => *existing = status,
            None => schedules.push(status),
        }
    }

    pub async fn add_backup_entry(&self, entry: BackupEntry) {
        let mut history = self.history.write().await;
        history.insert(0, entry);
        if history.len() > HISTORY_LIMIT {
            history.truncate(HISTORY_LIMIT);
        }
    }
}
