use super::uploader::{BlobUploader, StorageConnector};
use crate::error::Result;
use async_trait::async_trait;
use opendal::services::Azblob;
use opendal::Operator;
use tracing::{debug, info};

pub struct AzblobConnector;

#[async_trait]
impl StorageConnector for AzblobConnector {
    async fn connect(&self, connection_string: &str, container: &str) -> Result<Box<dyn BlobUploader>> {
        let builder = Azblob::from_connection_string(connection_string)?.container(container);
        let operator = Operator::new(builder)?.finish();
        info!("Using blob container '{}'", container);
        Ok(Box::new(AzblobUploader::new(operator)))
    }
}

pub struct AzblobUploader {
    operator: Operator,
}

impl AzblobUploader {
    pub fn new(operator: Operator) -> Self {
        Self { operator }
    }
}

#[async_trait]
impl BlobUploader for AzblobUploader {
    async fn upload(&self, blob_name: &str, content: Vec<u8>) -> Result<()> {
        debug!("Uploading {} ({} bytes)", blob_name, content.len());
        self.operator.write(blob_name, content).await?;
        Ok(())
    }

    fn name(&self) -> &'static str {
        "Azure Blob Storage"
    }
}
