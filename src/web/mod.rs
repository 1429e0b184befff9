mod server;
mod state;

pub use server::start_server;
pub use state::{AppState, BackupEntry, ScheduleStatus};
