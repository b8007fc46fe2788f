use std::fmt;
use std::fmt::{Debug, Formatter};
use std::sync::Mutex;

use aws_sdk_s3::types::Object;
use zeroize_derive::{Zeroize, ZeroizeOnDrop};

use crate::types::error::S3mirrorError;

pub mod error;
pub mod token;

pub const SYNC_SUMMARY_NAME: &str = "SYNC_SUMMARY";

/// A source object as seen by one listing snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectDescriptor {
    pub key: String,
    pub size: i64,
    pub e_tag: String,
}

impl ObjectDescriptor {
    pub fn new(key: &str, size: i64, e_tag: &str) -> Self {
        Self {
            key: key.to_string(),
            size,
            e_tag: e_tag.to_string(),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn size(&self) -> i64 {
        self.size
    }

    pub fn e_tag(&self) -> &str {
        &self.e_tag
    }
}

impl TryFrom<&Object> for ObjectDescriptor {
    type Error = S3mirrorError;

    fn try_from(object: &Object) -> Result<Self, Self::Error> {
        let key = object.key().ok_or(S3mirrorError::MissingObjectKey)?;

        Ok(Self::new(
            key,
            object.size().unwrap_or_default(),
            object.e_tag().unwrap_or_default(),
        ))
    }
}

/// What the destination currently holds for a key, compared with the source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncDecision {
    Absent,
    Stale { target_size: i64, target_e_tag: String },
    Current { target_size: i64, target_e_tag: String },
}

impl SyncDecision {
    pub fn is_copy_required(&self) -> bool {
        !matches!(self, SyncDecision::Current { .. })
    }
}

/// Events consumed by the progress indicator. `SourceListed` is sent once, before any
/// per-object event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncStatistics {
    SourceListed { total: u64 },
    SyncComplete { key: String },
    SyncSkip { key: String },
    SyncError { key: String },
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SyncReport {
    pub total: u64,
    pub copied: u64,
    pub skipped: u64,
    pub failed: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectOutcome {
    Copied,
    Skipped,
    Failed,
}

/// Outcome counters shared by every work unit. Only increments are exposed.
#[derive(Debug, Default)]
pub struct SyncCounters {
    report: Mutex<SyncReport>,
}

impl SyncCounters {
    pub fn new(total: u64) -> Self {
        Self {
            report: Mutex::new(SyncReport {
                total,
                ..Default::default()
            }),
        }
    }

    pub fn increment(&self, outcome: ObjectOutcome) {
        let mut report = self.report.lock().unwrap();
        match outcome {
            ObjectOutcome::Copied => report.copied += 1,
            ObjectOutcome::Skipped => report.skipped += 1,
            ObjectOutcome::Failed => report.failed += 1,
        }
    }

    pub fn snapshot(&self) -> SyncReport {
        *self.report.lock().unwrap()
    }
}

#[derive(Debug, Clone)]
pub enum S3Credentials {
    Credentials { access_keys: AccessKeys },
    FromEnvironment,
}

#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct AccessKeys {
    pub access_key: String,
    pub secret_access_key: String,
}

impl Debug for AccessKeys {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let mut keys = f.debug_struct("AccessKeys");
        keys.field("access_key", &self.access_key)
            .field("secret_access_key", &"** redacted **");
        keys.finish()
    }
}

pub fn normalize_e_tag(e_tag: &str) -> String {
    e_tag.replace('\"', "")
}
