use crate::domain::model::{ObjectRef, SignedUrl};
use crate::domain::ports::ObjectRepository;
use crate::utils::error::GcsPocError;
use std::fmt;
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Download,
    Upload,
    Peek,
    Sign,
}

impl Step {
    pub const ALL: [Step; 4] = [Step::Download, Step::Upload, Step::Peek, Step::Sign];
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Step::Download => "download",
            Step::Upload => "upload",
            Step::Peek => "peek",
            Step::Sign => "sign",
        };
        f.write_str(name)
    }
}

/// 後續步驟在失敗後是否繼續
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FailurePolicy {
    #[default]
    FailFast,
    KeepGoing,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbePlan {
    pub bucket: String,
    /// Object used by download, peek and sign.
    pub object: String,
    /// Local path that is also the uploaded object name.
    pub upload_object: String,
    pub destination: PathBuf,
    pub peek_lines: usize,
}

#[derive(Debug, Default)]
pub struct ProbeReport {
    pub completed: Vec<Step>,
    pub failures: Vec<(Step, GcsPocError)>,
    pub skipped: Vec<Step>,
    pub downloaded_bytes: Option<u64>,
    pub uploaded_bytes: Option<u64>,
    pub peeked_lines: Vec<String>,
    pub signed_url: Option<SignedUrl>,
}

impl ProbeReport {
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }

    /// 第一個失敗步驟的退出碼，全部成功為 0
    pub fn exit_code(&self) -> i32 {
        self.failures
            .first()
            .map(|(_, e)| e.exit_code())
            .unwrap_or(0)
    }
}

pub struct ProbeRunner<R: ObjectRepository> {
    repository: R,
    policy: FailurePolicy,
}

impl<R: ObjectRepository> ProbeRunner<R> {
    pub fn new(repository: R) -> Self {
        Self {
            repository,
            policy: FailurePolicy::default(),
        }
    }

    pub fn with_policy(repository: R, policy: FailurePolicy) -> Self {
        Self { repository, policy }
    }

    pub fn repository(&self) -> &R {
        &self.repository
    }

    pub async fn run(&self, plan: &ProbePlan) -> ProbeReport {
        let mut report = ProbeReport::default();

        tracing::info!(
            "Starting GCS probe against {} ({:?})",
            ObjectRef::new(plan.bucket.as_str(), plan.object.as_str()),
            self.policy
        );

        for (index, step) in Step::ALL.into_iter().enumerate() {
            tracing::info!("Running step: {}", step);

            match self.run_step(step, plan, &mut report).await {
                Ok(()) => report.completed.push(step),
                Err(e) => {
                    tracing::error!("❌ Step {} failed: {}", step, e);
                    report.failures.push((step, e));

                    if self.policy == FailurePolicy::FailFast {
                        report.skipped.extend_from_slice(&Step::ALL[index + 1..]);
                        break;
                    }
                }
            }
        }

        if !report.skipped.is_empty() {
            tracing::warn!("Skipped steps after failure: {:?}", report.skipped);
        }

        report
    }

    async fn run_step(
        &self,
        step: Step,
        plan: &ProbePlan,
        report: &mut ProbeReport,
    ) -> crate::utils::error::Result<()> {
        match step {
            Step::Download => {
                let bytes = self
                    .repository
                    .download(&plan.bucket, &plan.object, &plan.destination)
                    .await?;
                report.downloaded_bytes = Some(bytes);
            }
            Step::Upload => {
                let bytes = self
                    .repository
                    .upload(&plan.bucket, &plan.upload_object)
                    .await?;
                report.uploaded_bytes = Some(bytes);
            }
            Step::Peek => {
                report.peeked_lines = self
                    .repository
                    .peek_lines(&plan.bucket, &plan.object, plan.peek_lines)
                    .await?;
            }
            Step::Sign => {
                report.signed_url = Some(
                    self.repository
                        .signed_url(&plan.bucket, &plan.object)
                        .await?,
                );
            }
        }
        Ok(())
    }
}
