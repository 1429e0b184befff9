pub mod job;
pub mod naming;
pub mod scheduler;

pub use job::{
    backup_active, backup_all, execute, list_databases, BackupContext, BackupKind,
    UploadedBlob,
};
pub use scheduler::{run_timer, timer_triggers, wait_for_shutdown};
