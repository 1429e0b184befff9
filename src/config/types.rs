use crate::error::{BackupError, Result};
use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

pub const DB_CONNECTION_ENV: &str = "DB_CONNECTION_STRING";
pub const STORAGE_CONNECTION_ENV: &str = "STORAGE_CONNECTION_STRING";
pub const ACTIVE_DATABASES_ENV: &str = "ACTIVE_DATABASES";

/// Looks up a single environment variable by name.
pub type EnvLookup = fn(&str) -> Option<String>;

pub fn process_env(name: &str) -> Option<String> {
    std::env::var(name).ok()
}

/// Both connection strings, re-read on every backup invocation.
#[derive(Clone)]
pub struct Credentials {
    pub database: String,
    pub storage: String,
}

impl Credentials {
    pub fn from_lookup(lookup: EnvLookup) -> Result<Self> {
        let database = required(lookup, DB_CONNECTION_ENV)?;
        let storage = required(lookup, STORAGE_CONNECTION_ENV)?;
        Ok(Self { database, storage })
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("database", &"<redacted>")
            .field("storage", &"<redacted>")
            .finish()
    }
}

fn required(lookup: EnvLookup, name: &'static str) -> Result<String> {
    match lookup(name) {
        Some(value) if !value.trim().is_empty() => Ok(value),
        _ => Err(BackupError::MissingEnv(name)),
    }
}

/// Naming of blobs produced by the all-databases export.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum BlobNaming {
    /// `db_<name>_<timestamp>.sql`
    #[default]
    PerDatabase,
    /// `db_<timestamp>.sql`; every database in one run maps to the same blob.
    TimestampOnly,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AllDatabasesConfig {
    #[serde(default)]
    pub naming: BlobNaming,
    #[serde(default)]
    pub exclude_system: bool,
}

/// Wall-clock schedule of a timer trigger, evaluated in UTC.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Schedule {
    Daily { hour: u32, minute: u32 },
    /// Days past the end of a short month fire on its last day.
    Monthly { day: u32, hour: u32, minute: u32 },
}

impl Schedule {
    pub fn validate(&self) -> Result<()> {
        let (hour, minute) = match *self {
            Schedule::Daily { hour, minute } => (hour, minute),
            Schedule::Monthly { day, hour, minute } => {
                if !(1..=31).contains(&day) {
                    return Err(BackupError::Config(format!(
                        "monthly schedule day must be within 1..=31, got {}",
                        day
                    )));
                }
                (hour, minute)
            }
        };
        if hour > 23 || minute > 59 {
            return Err(BackupError::Config(format!(
                "invalid schedule time {:02}:{:02}",
                hour, minute
            )));
        }
        Ok(())
    }

    /// First fire time strictly after `now`.
    pub fn next_after(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        match *self {
            Schedule::Daily { hour, minute } => {
                let today = at(now.date_naive(), hour, minute);
                if today > now {
                    today
                } else {
                    today + Duration::days(1)
                }
            }
            Schedule::Monthly { day, hour, minute } => {
                let (year, month) = (now.year(), now.month());
                let this_month = at(clamped_day(year, month, day), hour, minute);
                if this_month > now {
                    return this_month;
                }
                let (year, month) = if month == 12 {
                    (year + 1, 1)
                } else {
                    (year, month + 1)
                };
                at(clamped_day(year, month, day), hour, minute)
            }
        }
    }
}

impl std::fmt::Display for Schedule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Schedule::Daily { hour, minute } => {
                write!(f, "Daily at {:02}:{:02} UTC", hour, minute)
            }
            Schedule::Monthly { day, hour, minute } => {
                write!(f, "Monthly on day {} at {:02}:{:02} UTC", day, hour, minute)
            }
        }
    }
}

fn at(date: NaiveDate, hour: u32, minute: u32) -> DateTime<Utc> {
    let midnight = Utc.from_utc_datetime(&date.and_time(NaiveTime::default()));
    midnight + Duration::hours(hour as i64) + Duration::minutes(minute as i64)
}

fn clamped_day(year: i32, month: u32, day: u32) -> NaiveDate {
    let mut day = day.clamp(1, 31);
    loop {
        if let Some(date) = NaiveDate::from_ymd_opt(year, month, day) {
            return date;
        }
        day -= 1;
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleConfig {
    #[serde(default = "default_daily")]
    pub daily: Schedule,
    #[serde(default = "default_monthly")]
    pub monthly: Schedule,
}

fn default_daily() -> Schedule {
    Schedule::Daily { hour: 0, minute: 0 }
}

fn default_monthly() -> Schedule {
    Schedule::Monthly {
        day: 1,
        hour: 0,
        minute: 0,
    }
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            daily: default_daily(),
            monthly: default_monthly(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebConfig {
    pub enabled: bool,
    pub port: u16,
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            port: 7071,
        }
    }
}

fn default_container() -> String {
    "sqlbackups".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Databases exported by the daily and HTTP triggers, in order.
    #[serde(default)]
    pub active_databases: Vec<String>,
    #[serde(default = "default_container")]
    pub container: String,
    #[serde(default)]
    pub all_databases: AllDatabasesConfig,
    #[serde(default)]
    pub schedules: ScheduleConfig,
    #[serde(default)]
    pub web: WebConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            active_databases: Vec::new(),
            container: default_container(),
            all_databases: AllDatabasesConfig::default(),
            schedules: ScheduleConfig::default(),
            web: WebConfig::default(),
        }
    }
}

impl AppConfig {
    /// `ACTIVE_DATABASES` (comma separated) replaces the configured list when set.
    pub fn with_env_overrides(mut self, lookup: EnvLookup) -> Self {
        if let Some(raw) = lookup(ACTIVE_DATABASES_ENV) {
            self.active_databases = raw
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(String::from)
                .collect();
        }
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.container.trim().is_empty() {
            return Err(BackupError::Config("container name is empty".to_string()));
        }
        self.schedules.daily.validate()?;
        self.schedules.monthly.validate()?;
        Ok(())
    }
}
