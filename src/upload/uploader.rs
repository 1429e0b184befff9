use crate::error::Result;
use async_trait::async_trait;

/// Opens a storage client scoped to one backup invocation.
#[async_trait]
pub trait StorageConnector: Send + Sync {
    async fn connect(&self, connection_string: &str, container: &str) -> Result<Box<dyn BlobUploader>>;
}

#[async_trait]
pub trait BlobUploader: Send + Sync {
    /// Writes `content` verbatim under `blob_name`, replacing any existing blob.
    async fn upload(&self, blob_name: &str, content: Vec<u8>) -> Result<()>;
    fn name(&self) -> &'static str;
}
