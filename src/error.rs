//! Run-level failures that stop a batch before or while it runs.

use redmine_api::RedmineError;
use thiserror::Error;

use crate::config::ConfigError;
use crate::issue_store::StorageError;
use crate::BatchSummary;

/// Ways a whole export run can end early. Per-issue failures are counted
/// in [`BatchSummary`] instead.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("client setup failed: {0}")]
    Client(#[from] RedmineError),
    #[error("connection failed")]
    Connectivity,
    #[error("output directory setup failed: {0}")]
    Storage(#[from] StorageError),
    #[error("interrupted by user ({0})")]
    Interrupted(BatchSummary),
}
