use std::path::PathBuf;
use thiserror::Error;

/// 儲存操作失敗的底層原因
#[derive(Error, Debug)]
pub enum StorageCause {
    #[error("storage client construction failed: {0}")]
    Client(#[source] object_store::Error),

    #[error("object store request failed: {0}")]
    Remote(#[source] object_store::Error),

    #[error("local file {}: {source}", .path.display())]
    LocalFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("byte transfer failed: {0}")]
    Transfer(#[source] std::io::Error),

    #[error("object name '{name}' cannot be used as-is: {reason}")]
    InvalidObjectName { name: String, reason: String },
}

impl StorageCause {
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Remote(object_store::Error::NotFound { .. }))
    }
}

#[derive(Error, Debug)]
pub enum GcsPocError {
    #[error("Failed to load base configuration from {location}: {source}")]
    ConfigLoadError {
        location: String,
        #[source]
        source: config::ConfigError,
    },

    #[error("Failed to parse configuration override from `{origin}`: {source}")]
    ConfigParseError {
        origin: String,
        #[source]
        source: config::ConfigError,
    },

    #[error("Failed to unmarshal configuration: {0}")]
    ConfigUnmarshalError(#[source] config::ConfigError),

    #[error("Failed to serialize GCS credential: {message}")]
    CredentialSerializationError {
        message: String,
        #[source]
        source: Option<serde_json::Error>,
    },

    #[error("Invalid value for {field}: '{value}' ({reason})")]
    InvalidArgumentError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Cannot download gs://{bucket}/{object}: {cause}")]
    DownloadError {
        bucket: String,
        object: String,
        #[source]
        cause: StorageCause,
    },

    #[error("Cannot upload gs://{bucket}/{object}: {cause}")]
    UploadError {
        bucket: String,
        object: String,
        #[source]
        cause: StorageCause,
    },

    #[error("Cannot read gs://{bucket}/{object}: {cause}")]
    ReadError {
        bucket: String,
        object: String,
        #[source]
        cause: StorageCause,
    },

    #[error("Cannot sign URL for gs://{bucket}/{object}: {cause}")]
    SignError {
        bucket: String,
        object: String,
        #[source]
        cause: StorageCause,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Configuration,
    Credential,
    Argument,
    Storage,
}

impl GcsPocError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::ConfigLoadError { .. }
            | Self::ConfigParseError { .. }
            | Self::ConfigUnmarshalError(_) => ErrorCategory::Configuration,
            Self::CredentialSerializationError { .. } => ErrorCategory::Credential,
            Self::InvalidArgumentError { .. } => ErrorCategory::Argument,
            Self::DownloadError { .. }
            | Self::UploadError { .. }
            | Self::ReadError { .. }
            | Self::SignError { .. } => ErrorCategory::Storage,
        }
    }

    /// 每一種錯誤對應固定的退出碼
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConfigLoadError { .. } => 10,
            Self::ConfigParseError { .. } => 11,
            Self::ConfigUnmarshalError(_) => 12,
            Self::CredentialSerializationError { .. } => 13,
            Self::InvalidArgumentError { .. } => 14,
            Self::DownloadError { .. } => 20,
            Self::UploadError { .. } => 21,
            Self::ReadError { .. } => 22,
            Self::SignError { .. } => 23,
        }
    }

    pub fn storage_cause(&self) -> Option<&StorageCause> {
        match self {
            Self::DownloadError { cause, .. }
            | Self::UploadError { cause, .. }
            | Self::ReadError { cause, .. }
            | Self::SignError { cause, .. } => Some(cause),
            _ => None,
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            Self::ConfigLoadError { location, .. } => {
                format!("No configuration file found at {}", location)
            }
            Self::ConfigParseError { origin, .. } => {
                format!("The configuration override in `{}` is not valid", origin)
            }
            Self::ConfigUnmarshalError(_) => {
                "The merged configuration does not have the expected shape".to_string()
            }
            Self::CredentialSerializationError { .. } => {
                "The GCS service-account credential could not be prepared".to_string()
            }
            Self::InvalidArgumentError { field, value, .. } => {
                format!("Invalid {}: '{}'", field, value)
            }
            Self::DownloadError { bucket, object, .. } => {
                format!("cannot download file from gcs: gs://{}/{}", bucket, object)
            }
            Self::UploadError { bucket, object, .. } => {
                format!("cannot upload file to gcs: gs://{}/{}", bucket, object)
            }
            Self::ReadError { bucket, object, .. } => {
                format!("cannot read file from gcs: gs://{}/{}", bucket, object)
            }
            Self::SignError { bucket, object, .. } => {
                format!("cannot sign url from gcs: gs://{}/{}", bucket, object)
            }
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            Self::ConfigLoadError { .. } => {
                "Check API_CONFIG_PATH and API_CONFIG_NAME point at an existing config file"
            }
            Self::ConfigParseError { .. } => {
                "Make sure the `configs` variable holds a YAML or JSON mapping"
            }
            Self::ConfigUnmarshalError(_) => {
                "Check that `secrets` is a mapping and `secrets.gcs-credential` is a JSON object"
            }
            Self::CredentialSerializationError { .. } => {
                "Provide secrets.gcs-credential in the config file or via SECRET_GCS_CREDENTIAL"
            }
            Self::InvalidArgumentError { .. } => "Fix the command-line argument and retry",
            _ if matches!(
                self.storage_cause(),
                Some(StorageCause::InvalidObjectName { .. })
            ) =>
            {
                "Use an object name without a leading '/', empty segments, or '.'/'..' segments"
            }
            Self::DownloadError { cause, .. } | Self::ReadError { cause, .. }
                if cause.is_not_found() =>
            {
                "Verify the bucket and object names exist"
            }
            Self::DownloadError { .. } | Self::UploadError { .. } | Self::ReadError { .. } => {
                "Verify bucket permissions for the service account and local file access"
            }
            Self::SignError { .. } => {
                "Signing needs a service-account credential that includes a private key"
            }
        }
    }
}

pub type Result<T> = std::result::Result<T, GcsPocError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn storage_error(cause: StorageCause) -> GcsPocError {
        GcsPocError::DownloadError {
            bucket: "bucket".to_string(),
            object: "object".to_string(),
            cause,
        }
    }

    #[test]
    fn test_exit_codes_are_distinct() {
        let message = || config::ConfigError::Message("x".into());
        fn storage(build: fn(String, String, StorageCause) -> GcsPocError) -> GcsPocError {
            build(
                "bucket".into(),
                "object".into(),
                StorageCause::Transfer(std::io::Error::other("x")),
            )
        }

        let errors = vec![
            GcsPocError::ConfigLoadError {
                location: "./config/config".into(),
                source: message(),
            },
            GcsPocError::ConfigParseError {
                origin: "configs".into(),
                source: message(),
            },
            GcsPocError::ConfigUnmarshalError(message()),
            GcsPocError::CredentialSerializationError {
                message: "x".into(),
                source: None,
            },
            GcsPocError::InvalidArgumentError {
                field: "bucket".into(),
                value: "".into(),
                reason: "empty".into(),
            },
            storage(|bucket, object, cause| GcsPocError::DownloadError { bucket, object, cause }),
            storage(|bucket, object, cause| GcsPocError::UploadError { bucket, object, cause }),
            storage(|bucket, object, cause| GcsPocError::ReadError { bucket, object, cause }),
            storage(|bucket, object, cause| GcsPocError::SignError { bucket, object, cause }),
        ];

        let codes: HashSet<i32> = errors.iter().map(GcsPocError::exit_code).collect();
        assert_eq!(codes.len(), errors.len());
        assert!(!codes.contains(&0));
    }

    #[test]
    fn test_not_found_is_detected() {
        let err = storage_error(StorageCause::Remote(object_store::Error::NotFound {
            path: "object".to_string(),
            source: "missing".into(),
        }));

        assert!(err.storage_cause().unwrap().is_not_found());
        assert_eq!(err.category(), ErrorCategory::Storage);
        assert_eq!(err.recovery_suggestion(), "Verify the bucket and object names exist");
    }

    #[test]
    fn test_invalid_object_name_suggestion() {
        let err = storage_error(StorageCause::InvalidObjectName {
            name: "./a.txt".to_string(),
            reason: "'.' segment".to_string(),
        });

        assert_eq!(err.exit_code(), 20);
        assert!(err.recovery_suggestion().contains("leading '/'"));
        assert!(err.to_string().contains("./a.txt"));
    }

    #[test]
    fn test_configuration_errors_category() {
        let err = GcsPocError::ConfigUnmarshalError(config::ConfigError::Message("bad".into()));
        assert_eq!(err.category(), ErrorCategory::Configuration);
        assert_eq!(err.exit_code(), 12);
    }
}
