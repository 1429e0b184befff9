use crate::config::BlobNaming;
use chrono::{DateTime, Utc};

pub fn timestamp_suffix(timestamp: DateTime<Utc>) -> String {
    timestamp.format("%Y%m%d%H%M%S").to_string()
}

pub fn blob_name(naming: BlobNaming, db_name: &str, timestamp: DateTime<Utc>) -> String {
    match naming {
        BlobNaming::PerDatabase => format!("db_{}_{}.sql", db_name, timestamp_suffix(timestamp)),
        BlobNaming::TimestampOnly => format!("db_{}.sql", timestamp_suffix(timestamp)),
    }
}
