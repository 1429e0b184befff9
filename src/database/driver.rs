use crate::error::Result;
use async_trait::async_trait;

/// Opens one session per backup invocation.
#[async_trait]
pub trait DatabaseConnector: Send + Sync {
    async fn connect(&self, connection_string: &str) -> Result<Box<dyn DatabaseSession>>;
    fn engine_name(&self) -> &'static str;
}

/// A single server connection, used sequentially for every target database.
#[async_trait]
pub trait DatabaseSession: Send {
    async fn list_databases(&mut self) -> Result<Vec<String>>;
    async fn use_database(&mut self, db_name: &str) -> Result<()>;
    /// Full SQL dump of the database selected by the last `use_database`.
    async fn export(&mut self, db_name: &str) -> Result<Vec<u8>>;
    async fn close(self: Box<Self>) -> Result<()>;
}
