mod azblob;
mod uploader;

pub use azblob::AzblobConnector;
pub use uploader::{BlobUploader, StorageConnector};
