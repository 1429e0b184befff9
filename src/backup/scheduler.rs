use super::job::{execute, BackupKind};
use crate::config::{AppConfig, Schedule};
use crate::web::{AppState, ScheduleStatus};
use chrono::{DateTime, Utc};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::select;
use tokio::time::sleep;
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimerTrigger {
    pub name: &'static str,
    pub schedule: Schedule,
    pub kind: BackupKind,
}

/// Daily run of the active list and monthly run of every database.
pub fn timer_triggers(config: &AppConfig) -> Vec<TimerTrigger> {
    vec![
        TimerTrigger {
            name: "daily",
            schedule: config.schedules.daily,
            kind: BackupKind::Active,
        },
        TimerTrigger {
            name: "monthly",
            schedule: config.schedules.monthly,
            kind: BackupKind::All,
        },
    ]
}

/// Resolves once the shutdown counter has been bumped.
pub async fn wait_for_shutdown(shutdown: &AtomicUsize) {
    while shutdown.load(Ordering::Relaxed) == 0 {
        sleep(std::time::Duration::from_millis(100)).await;
    }
}

pub async fn run_timer(trigger: TimerTrigger, state: Arc<AppState>, shutdown: Arc<AtomicUsize>) {
    info!("Starting {} timer: {}", trigger.name, trigger.schedule);

    let mut last: Option<DateTime<Utc>> = None;
    let mut previous_due: Option<DateTime<Utc>> = None;

    loop {
        let now = Utc::now();
        // Never reschedule onto the slot that just fired.
        let base = match previous_due {
            Some(due) if due > now => due,
            _ => now,
        };
        let next = trigger.schedule.next_after(base);
        state
            .update_schedule(ScheduleStatus {
                name: trigger.name.to_string(),
                schedule: trigger.schedule.to_string(),
                last,
                next: Some(next),
                last_updated: now,
            })
            .await;

        let wait = (next - now).to_std().unwrap_or_default();
        select! {
            _ = sleep(wait) => {}
            _ = wait_for_shutdown(&shutdown) => {
                info!("{} timer shutdown requested", trigger.name);
                break;
            }
        }

        let fired_at = Utc::now();
        info!(
            "{} timer fired at {} (last: {}, next due: {})",
            trigger.name,
            fired_at.format("%Y-%m-%d %H:%M:%S UTC"),
            last.map(|t| t.format("%Y-%m-%d %H:%M:%S UTC").to_string())
                .unwrap_or_else(|| "never".to_string()),
            next.format("%Y-%m-%d %H:%M:%S UTC")
        );

        // Failures are already logged and recorded by `execute`.
        let _ = execute(&state, trigger.name, trigger.kind).await;

        last = Some(fired_at);
        previous_due = Some(next);
    }

    state
        .update_schedule(ScheduleStatus {
            name: trigger.name.to_string(),
            schedule: trigger.schedule.to_string(),
            last,
            next: None,
            last_updated: Utc::now(),
        })
        .await;
    info!("{} timer stopped", trigger.name);
}
