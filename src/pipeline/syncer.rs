use anyhow::Result;
use tracing::info;

use super::change_detector::ChangeDetector;
use super::copy_verifier::CopyVerifier;
use super::stage::Stage;
use crate::types::{ObjectDescriptor, ObjectOutcome, SyncDecision};

/// The unit of work for one listed object: decide, then copy and verify if needed.
pub struct ObjectSyncer {
    change_detector: ChangeDetector,
    copy_verifier: CopyVerifier,
    dry_run: bool,
}

impl ObjectSyncer {
    pub fn new(base: &Stage) -> Self {
        Self {
            change_detector: ChangeDetector::new(dyn_clone::clone_box(&*base.target)),
            copy_verifier: CopyVerifier::new(
                dyn_clone::clone_box(&*base.source),
                dyn_clone::clone_box(&*base.target),
            ),
            dry_run: base.config.dry_run,
        }
    }

    pub async fn sync_object(&self, source_object: &ObjectDescriptor) -> Result<ObjectOutcome> {
        let key = source_object.key();

        let decision = self.change_detector.detect(source_object).await?;
        if let SyncDecision::Current { .. } = decision {
            info!(key = key, "object is up to date. skipping.");
            return Ok(ObjectOutcome::Skipped);
        }

        if self.dry_run {
            info!(
                key = key,
                size = source_object.size(),
                target_exists = decision != SyncDecision::Absent,
                "[dry-run] object would be copied."
            );
            return Ok(ObjectOutcome::Copied);
        }

        self.copy_verifier.copy_and_verify(source_object).await?;

        Ok(ObjectOutcome::Copied)
    }
}
