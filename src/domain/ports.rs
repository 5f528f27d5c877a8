use crate::domain::model::SignedUrl;
use crate::utils::error::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use object_store::signer::Signer;
use object_store::ObjectStore;
use std::path::Path;
use std::sync::Arc;

/// Client handle for one bucket. Dropping it closes the connection.
#[derive(Debug, Clone)]
pub struct BucketHandle {
    pub store: Arc<dyn ObjectStore>,
    pub signer: Arc<dyn Signer>,
}

/// Builds a fresh client per operation.
pub trait Connector: Send + Sync {
    fn connect(&self, bucket: &str) -> object_store::Result<BucketHandle>;
}

pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

#[async_trait]
pub trait ObjectRepository: Send + Sync {
    /// Returns the number of bytes written to `destination`.
    async fn download(&self, bucket: &str, object: &str, destination: &Path) -> Result<u64>;

    /// `object` is both the local source path and the remote object name.
    async fn upload(&self, bucket: &str, object: &str) -> Result<u64>;

    async fn peek_lines(&self, bucket: &str, object: &str, max_lines: usize)
        -> Result<Vec<String>>;

    async fn signed_url(&self, bucket: &str, object: &str) -> Result<SignedUrl>;
}
