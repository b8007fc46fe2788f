use std::fmt;

use thiserror::Error;

use crate::types::SyncReport;

#[derive(Error, Debug, PartialEq)]
pub enum S3mirrorError {
    #[error("cancelled")]
    Cancelled,
    #[error("a listed object has no key.")]
    MissingObjectKey,
    #[error(
        "verification failed. key={key}, size(source: {source_size}, target: {target_size}), ETag(source: {source_e_tag}, target: {target_e_tag})."
    )]
    VerificationFailed {
        key: String,
        source_size: i64,
        target_size: i64,
        source_e_tag: String,
        target_e_tag: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncPhase {
    BucketConfig,
    Listing,
    Object,
}

impl fmt::Display for SyncPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let phase = match self {
            SyncPhase::BucketConfig => "bucket configuration sync",
            SyncPhase::Listing => "source listing",
            SyncPhase::Object => "object sync",
        };
        f.write_str(phase)
    }
}

/// The first failure of a run, with the counters as they stood when every in-flight
/// unit had finished.
#[derive(Debug)]
pub struct SyncFailure {
    pub phase: SyncPhase,
    pub key: Option<String>,
    pub error: anyhow::Error,
    pub report: SyncReport,
}

impl SyncFailure {
    pub fn new(
        phase: SyncPhase,
        key: Option<String>,
        error: anyhow::Error,
        report: SyncReport,
    ) -> Self {
        Self {
            phase,
            key,
            error,
            report,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.error.downcast_ref::<S3mirrorError>() == Some(&S3mirrorError::Cancelled)
    }
}

impl fmt::Display for SyncFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.key {
            Some(key) => write!(f, "{} failed. key={key}: {:#}", self.phase, self.error),
            None => write!(f, "{} failed: {:#}", self.phase, self.error),
        }
    }
}

impl std::error::Error for SyncFailure {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(self.error.as_ref())
    }
}
