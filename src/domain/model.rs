use chrono::{DateTime, Utc};
use std::fmt;
use url::Url;

/// (bucket, object) pair identifying a remote blob.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectRef {
    pub bucket: String,
    pub object: String,
}

impl ObjectRef {
    pub fn new(bucket: impl Into<String>, object: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            object: object.into(),
        }
    }
}

impl fmt::Display for ObjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "gs://{}/{}", self.bucket, self.object)
    }
}

/// A time-limited GET URL for one object.
///
/// `issued_at` and `expires_at` come from the repository's `Clock`. The
/// signature's own `X-Goog-Date` is stamped by the signer when it signs, so
/// the two can differ by the time the signing call takes.
#[derive(Debug, Clone, PartialEq)]
pub struct SignedUrl {
    pub url: Url,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}
