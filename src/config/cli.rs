use crate::core::runner::{FailurePolicy, ProbePlan};
use crate::utils::error::Result;
use crate::utils::validation::*;
use clap::Parser;
use std::path::Path;

#[derive(Debug, Clone, Parser)]
#[command(name = "gcs-poc")]
#[command(about = "Download, upload, peek and sign objects in a Google Cloud Storage bucket")]
pub struct CliArgs {
    #[arg(long, default_value = "go-poc-gcs")]
    pub bucket: String,

    #[arg(long, default_value = "profiles_202406222320.sql")]
    pub object: String,

    #[arg(long, default_value = "google-create-credential.txt")]
    pub upload: String,

    #[arg(long, default_value = "./data")]
    pub destination_dir: String,

    #[arg(long, default_value = "2")]
    pub peek_lines: usize,

    #[arg(long, help = "Run every step even after a failure")]
    pub keep_going: bool,

    #[arg(long, help = "Enable verbose output")]
    pub verbose: bool,
}

impl CliArgs {
    pub fn plan(&self) -> ProbePlan {
        ProbePlan {
            bucket: self.bucket.clone(),
            object: self.object.clone(),
            upload_object: self.upload.clone(),
            destination: Path::new(&self.destination_dir).join(&self.object),
            peek_lines: self.peek_lines,
        }
    }

    pub fn policy(&self) -> FailurePolicy {
        if self.keep_going {
            FailurePolicy::KeepGoing
        } else {
            FailurePolicy::FailFast
        }
    }
}

impl Validate for CliArgs {
    fn validate(&self) -> Result<()> {
        validate_bucket_name("bucket", &self.bucket)?;
        validate_object_name("object", &self.object)?;
        validate_object_name("upload", &self.upload)?;
        validate_path("destination_dir", &self.destination_dir)?;
        validate_positive_number("peek_lines", self.peek_lines, 1)?;

        tracing::debug!("✅ CLI arguments validation passed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::error::GcsPocError;

    #[test]
    fn test_defaults_match_fixed_constants() {
        let args = CliArgs::parse_from(["gcs-poc"]);

        assert!(args.validate().is_ok());
        assert_eq!(args.policy(), FailurePolicy::FailFast);

        let plan = args.plan();
        assert_eq!(plan.bucket, "go-poc-gcs");
        assert_eq!(
            plan.destination,
            Path::new("./data").join("profiles_202406222320.sql")
        );
        assert_eq!(plan.upload_object, "google-create-credential.txt");
        assert_eq!(plan.peek_lines, 2);
    }

    #[test]
    fn test_keep_going_and_invalid_bucket() {
        let args = CliArgs::parse_from(["gcs-poc", "--keep-going", "--bucket", "Bad_Bucket"]);

        assert_eq!(args.policy(), FailurePolicy::KeepGoing);
        let err = args.validate().unwrap_err();
        assert_eq!(err.exit_code(), 14);
    }

    #[test]
    fn test_upload_name_must_be_stored_verbatim() {
        for upload in ["./google-create-credential.txt", "/tmp/upload.txt", "data//upload.txt"] {
            let args = CliArgs::parse_from(["gcs-poc", "--upload", upload]);

            match args.validate() {
                Err(GcsPocError::InvalidArgumentError { field, value, .. }) => {
                    assert_eq!(field, "upload");
                    assert_eq!(value, upload);
                }
                other => panic!("expected InvalidArgumentError for {upload}, got {other:?}"),
            }
        }
    }
}
