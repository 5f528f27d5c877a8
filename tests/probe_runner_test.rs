use async_trait::async_trait;
use chrono::Utc;
use gcs_poc::core::runner::Step;
use gcs_poc::core::{ObjectRepository, SignedUrl};
use gcs_poc::utils::error::StorageCause;
use gcs_poc::{FailurePolicy, GcsPocError, ProbePlan, ProbeRunner, Result};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use url::Url;

/// 依照設定讓指定步驟失敗，並記錄呼叫順序
#[derive(Default)]
struct ScriptedRepository {
    failing: Vec<Step>,
    calls: Mutex<Vec<Step>>,
}

impl ScriptedRepository {
    fn failing(steps: &[Step]) -> Self {
        Self {
            failing: steps.to_vec(),
            ..Default::default()
        }
    }

    fn record(&self, step: Step) -> bool {
        self.calls.lock().unwrap().push(step);
        self.failing.contains(&step)
    }

    fn calls(&self) -> Vec<Step> {
        self.calls.lock().unwrap().clone()
    }
}

fn transfer_error() -> StorageCause {
    StorageCause::Transfer(std::io::Error::other("scripted failure"))
}

#[async_trait]
impl ObjectRepository for ScriptedRepository {
    async fn download(&self, bucket: &str, object: &str, _destination: &Path) -> Result<u64> {
        if self.record(Step::Download) {
            return Err(GcsPocError::DownloadError {
                bucket: bucket.to_string(),
                object: object.to_string(),
                cause: transfer_error(),
            });
        }
        Ok(42)
    }

    async fn upload(&self, bucket: &str, object: &str) -> Result<u64> {
        if self.record(Step::Upload) {
            return Err(GcsPocError::UploadError {
                bucket: bucket.to_string(),
                object: object.to_string(),
                cause: transfer_error(),
            });
        }
        Ok(7)
    }

    async fn peek_lines(&self, bucket: &str, object: &str, max_lines: usize) -> Result<Vec<String>> {
        if self.record(Step::Peek) {
            return Err(GcsPocError::ReadError {
                bucket: bucket.to_string(),
                object: object.to_string(),
                cause: transfer_error(),
            });
        }
        Ok(["a", "b", "c"]
            .iter()
            .take(max_lines)
            .map(|s| s.to_string())
            .collect())
    }

    async fn signed_url(&self, bucket: &str, object: &str) -> Result<SignedUrl> {
        if self.record(Step::Sign) {
            return Err(GcsPocError::SignError {
                bucket: bucket.to_string(),
                object: object.to_string(),
                cause: transfer_error(),
            });
        }
        let now = Utc::now();
        Ok(SignedUrl {
            url: Url::parse(&format!("https://storage.googleapis.com/{}/{}", bucket, object))
                .unwrap(),
            issued_at: now,
            expires_at: now + chrono::Duration::minutes(15),
        })
    }
}

fn plan() -> ProbePlan {
    ProbePlan {
        bucket: "go-poc-gcs".to_string(),
        object: "profiles_202406222320.sql".to_string(),
        upload_object: "google-create-credential.txt".to_string(),
        destination: PathBuf::from("./data/profiles_202406222320.sql"),
        peek_lines: 2,
    }
}

#[tokio::test]
async fn test_all_steps_run_in_order() {
    let runner = ProbeRunner::new(ScriptedRepository::default());

    let report = runner.run(&plan()).await;

    assert!(report.is_success());
    assert_eq!(report.exit_code(), 0);
    assert_eq!(report.completed, Step::ALL.to_vec());
    assert_eq!(runner.repository().calls(), Step::ALL.to_vec());
    assert_eq!(report.downloaded_bytes, Some(42));
    assert_eq!(report.uploaded_bytes, Some(7));
    assert_eq!(report.peeked_lines, vec!["a".to_string(), "b".to_string()]);
    assert!(report.signed_url.is_some());
}

#[tokio::test]
async fn test_fail_fast_skips_remaining_steps() {
    let runner = ProbeRunner::new(ScriptedRepository::failing(&[Step::Upload]));

    let report = runner.run(&plan()).await;

    assert!(!report.is_success());
    assert_eq!(report.completed, vec![Step::Download]);
    assert_eq!(report.skipped, vec![Step::Peek, Step::Sign]);
    assert_eq!(runner.repository().calls(), vec![Step::Download, Step::Upload]);
    assert_eq!(report.exit_code(), 21);
    assert!(report.signed_url.is_none());
}

#[tokio::test]
async fn test_keep_going_runs_every_step() {
    let runner = ProbeRunner::with_policy(
        ScriptedRepository::failing(&[Step::Download, Step::Peek]),
        FailurePolicy::KeepGoing,
    );

    let report = runner.run(&plan()).await;

    assert_eq!(runner.repository().calls(), Step::ALL.to_vec());
    assert_eq!(report.completed, vec![Step::Upload, Step::Sign]);
    assert!(report.skipped.is_empty());

    let failed: Vec<Step> = report.failures.iter().map(|(step, _)| *step).collect();
    assert_eq!(failed, vec![Step::Download, Step::Peek]);
    // 退出碼取第一個失敗
    assert_eq!(report.exit_code(), 20);
}
