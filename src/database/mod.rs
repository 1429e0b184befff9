mod driver;
mod mysql;

pub use driver::{DatabaseConnector, DatabaseSession};
pub use mysql::MysqlConnector;

/// Engine-internal schemas skipped when `all_databases.exclude_system` is set.
pub const SYSTEM_DATABASES: &[&str] = &["information_schema", "performance_schema", "mysql", "sys"];

pub fn is_system_database(name: &str) -> bool {
    SYSTEM_DATABASES
        .iter()
        .any(|system| system.eq_ignore_ascii_case(name))
}
