pub use galleon_api_types::storage::{
    Bytes, SharedStorage, StorageError, StorageProvider, StorageResult,
};

use serde::Deserialize;
use std::path::PathBuf;
use std::sync::Arc;

pub mod fs;
pub mod mem;
pub mod s3_client;

#[derive(Deserialize)]
pub struct S3Config {
    pub name: String,
    pub endpoint_url: String,
    pub region: String,
    pub access_key_id: Option<String>,
    pub access_key_secret: Option<String>,
}

/// Storage backend selection, flattened into the service config file.
#[derive(Deserialize)]
pub enum Config {
    #[serde(rename = "storage_path")]
    Path(PathBuf),
    #[serde(rename = "storage_s3")]
    S3(S3Config),
}

impl Config {
    pub fn into_provider(self) -> StorageResult<SharedStorage> {
        match self {
            Config::Path(root) => Ok(Arc::new(fs::FsStorageProvider::new(root)?)),
            Config::S3(c) => Ok(Arc::new(s3_client::S3StorageProvider::new(
                &c.name,
                &c.endpoint_url,
                &c.region,
                &c.access_key_id.unwrap_or_else(|| {
                    std::env::var("GALLEON_STORE_BUCKET_KEY_ID").expect(
                        "Failed to find store bucket key id in environment variable or config",
                    )
                }),
                &c.access_key_secret.unwrap_or_else(|| {
                    std::env::var("GALLEON_STORE_BUCKET_KEY_SECRET").expect(
                        "Failed to find store bucket key secret in environment variable or config",
                    )
                }),
            ))),
        }
    }
}
