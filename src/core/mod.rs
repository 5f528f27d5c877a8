pub mod credential;
pub mod runner;

pub use crate::domain::model::{ObjectRef, SignedUrl};
pub use crate::domain::ports::{BucketHandle, Clock, Connector, ObjectRepository, SystemClock};
pub use crate::utils::error::Result;
