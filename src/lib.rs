pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use crate::config::cli::CliArgs;

pub use crate::adapters::gcs::{GcsConnector, GcsRepository};
pub use crate::config::{resolve, AppConfig, EnvSnapshot};
pub use crate::core::credential::assemble;
pub use crate::core::runner::{FailurePolicy, ProbePlan, ProbeReport, ProbeRunner};
pub use crate::utils::error::{GcsPocError, Result};
