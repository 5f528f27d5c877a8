use crate::domain::model::SignedUrl;
use crate::domain::ports::{BucketHandle, Clock, Connector, ObjectRepository, SystemClock};
use crate::utils::error::{GcsPocError, Result, StorageCause};
use async_trait::async_trait;
use futures::TryStreamExt;
use http::Method;
use object_store::buffered::BufWriter;
use object_store::gcp::GoogleCloudStorageBuilder;
use object_store::path::Path as ObjectPath;
use object_store::ObjectStore;
use std::fmt;
use std::io;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWriteExt};
use tokio_util::io::StreamReader;

/// 簽名網址有效時間
pub const SIGNED_URL_TTL: Duration = Duration::from_secs(15 * 60);

/// Builds a GCS client from service-account JSON bytes.
#[derive(Clone)]
pub struct GcsConnector {
    credential: Vec<u8>,
}

impl GcsConnector {
    pub fn new(credential: Vec<u8>) -> Self {
        Self { credential }
    }
}

// 不輸出憑證內容
impl fmt::Debug for GcsConnector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GcsConnector")
            .field("credential", &format_args!("<{} bytes>", self.credential.len()))
            .finish()
    }
}

impl Connector for GcsConnector {
    fn connect(&self, bucket: &str) -> object_store::Result<BucketHandle> {
        let key = std::str::from_utf8(&self.credential).map_err(|e| object_store::Error::Generic {
            store: "GCS",
            source: Box::new(e),
        })?;

        let gcs = Arc::new(
            GoogleCloudStorageBuilder::new()
                .with_bucket_name(bucket)
                .with_service_account_key(key)
                .build()?,
        );

        Ok(BucketHandle {
            store: gcs.clone(),
            signer: gcs,
        })
    }
}

pub struct GcsRepository<C: Connector, K: Clock = SystemClock> {
    connector: C,
    clock: K,
}

impl<C: Connector> GcsRepository<C> {
    pub fn new(connector: C) -> Self {
        Self {
            connector,
            clock: SystemClock,
        }
    }
}

impl GcsRepository<GcsConnector> {
    pub fn from_credential(credential: Vec<u8>) -> Self {
        Self::new(GcsConnector::new(credential))
    }
}

impl<C: Connector, K: Clock> GcsRepository<C, K> {
    pub fn with_clock(connector: C, clock: K) -> Self {
        Self { connector, clock }
    }

    fn open(&self, bucket: &str) -> std::result::Result<BucketHandle, StorageCause> {
        self.connector.connect(bucket).map_err(StorageCause::Client)
    }
}

/// 物件名稱原樣轉成 object_store 路徑，會被改寫的名稱直接拒絕
pub fn object_path(object: &str) -> std::result::Result<ObjectPath, StorageCause> {
    let invalid = |reason: String| StorageCause::InvalidObjectName {
        name: object.to_string(),
        reason,
    };

    let path = ObjectPath::parse(object).map_err(|e| invalid(e.to_string()))?;
    // parse 會默默去掉開頭與結尾的 '/'
    if path.as_ref() != object {
        return Err(invalid(format!("would be stored as '{}'", path)));
    }
    Ok(path)
}

async fn open_reader(
    store: &dyn ObjectStore,
    path: &ObjectPath,
) -> std::result::Result<impl AsyncBufRead + Unpin, StorageCause> {
    let stream = store
        .get(path)
        .await
        .map_err(StorageCause::Remote)?
        .into_stream();

    Ok(StreamReader::new(stream.map_err(io::Error::other)))
}

/// 最多讀取 `max_lines` 行，之後不再向 reader 要資料
pub async fn read_lines<R>(reader: R, max_lines: usize) -> io::Result<Vec<String>>
where
    R: AsyncBufRead + Unpin,
{
    let mut lines = reader.lines();
    let mut collected = Vec::with_capacity(max_lines);

    while collected.len() < max_lines {
        match lines.next_line().await? {
            Some(line) => collected.push(line),
            None => break,
        }
    }

    Ok(collected)
}

#[async_trait]
impl<C: Connector, K: Clock> ObjectRepository for GcsRepository<C, K> {
    async fn download(&self, bucket: &str, object: &str, destination: &Path) -> Result<u64> {
        let fail = |cause: StorageCause| GcsPocError::DownloadError {
            bucket: bucket.to_string(),
            object: object.to_string(),
            cause,
        };

        let path = object_path(object).map_err(fail)?;
        let handle = self.open(bucket).map_err(fail)?;

        // 先開啟遠端物件，物件不存在時不會留下本地檔案
        let mut reader = open_reader(handle.store.as_ref(), &path)
            .await
            .map_err(fail)?;

        if let Some(parent) = destination.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await.map_err(|source| {
                fail(StorageCause::LocalFile {
                    path: parent.to_path_buf(),
                    source,
                })
            })?;
        }

        let mut file = tokio::fs::File::create(destination)
            .await
            .map_err(|source| {
                fail(StorageCause::LocalFile {
                    path: destination.to_path_buf(),
                    source,
                })
            })?;

        let written = tokio::io::copy(&mut reader, &mut file)
            .await
            .map_err(|e| fail(StorageCause::Transfer(e)))?;
        file.flush()
            .await
            .map_err(|e| fail(StorageCause::Transfer(e)))?;

        tracing::info!(
            "⬇️  Downloaded gs://{}/{} to {} ({} bytes)",
            bucket,
            object,
            destination.display(),
            written
        );
        Ok(written)
    }

    async fn upload(&self, bucket: &str, object: &str) -> Result<u64> {
        let fail = |cause: StorageCause| GcsPocError::UploadError {
            bucket: bucket.to_string(),
            object: object.to_string(),
            cause,
        };

        // 本地路徑與遠端物件名稱是同一個字串
        let path = object_path(object).map_err(fail)?;
        let handle = self.open(bucket).map_err(fail)?;

        let mut file = tokio::fs::File::open(object).await.map_err(|source| {
            fail(StorageCause::LocalFile {
                path: object.into(),
                source,
            })
        })?;

        let mut writer = BufWriter::new(Arc::clone(&handle.store), path);

        let written = match tokio::io::copy(&mut file, &mut writer).await {
            Ok(written) => written,
            Err(e) => {
                if let Err(abort_err) = writer.abort().await {
                    tracing::warn!("Failed to abort upload of {}: {}", object, abort_err);
                }
                return Err(fail(StorageCause::Transfer(e)));
            }
        };

        // shutdown 才會真正完成遠端物件
        writer
            .shutdown()
            .await
            .map_err(|e| fail(StorageCause::Transfer(e)))?;

        tracing::info!(
            "⬆️  Uploaded {} to gs://{}/{} ({} bytes)",
            object,
            bucket,
            object,
            written
        );
        Ok(written)
    }

    async fn peek_lines(
        &self,
        bucket: &str,
        object: &str,
        max_lines: usize,
    ) -> Result<Vec<String>> {
        let fail = |cause: StorageCause| GcsPocError::ReadError {
            bucket: bucket.to_string(),
            object: object.to_string(),
            cause,
        };

        let path = object_path(object).map_err(fail)?;
        let handle = self.open(bucket).map_err(fail)?;
        let reader = open_reader(handle.store.as_ref(), &path)
            .await
            .map_err(fail)?;

        let lines = read_lines(reader, max_lines)
            .await
            .map_err(|e| fail(StorageCause::Transfer(e)))?;

        for (row, line) in lines.iter().enumerate() {
            tracing::debug!("gs://{}/{} row {}: {}", bucket, object, row, line);
        }
        Ok(lines)
    }

    async fn signed_url(&self, bucket: &str, object: &str) -> Result<SignedUrl> {
        let fail = |cause: StorageCause| GcsPocError::SignError {
            bucket: bucket.to_string(),
            object: object.to_string(),
            cause,
        };

        let path = object_path(object).map_err(fail)?;
        let handle = self.open(bucket).map_err(fail)?;
        let issued_at = self.clock.now();

        let url = handle
            .signer
            .signed_url(Method::GET, &path, SIGNED_URL_TTL)
            .await
            .map_err(|e| fail(StorageCause::Remote(e)))?;

        let expires_at = issued_at + chrono::Duration::seconds(SIGNED_URL_TTL.as_secs() as i64);
        tracing::info!(
            "🔗 Signed GET URL for gs://{}/{} valid until {}",
            bucket,
            object,
            expires_at
        );

        Ok(SignedUrl {
            url,
            issued_at,
            expires_at,
        })
    }
}
