use anyhow::{Context, Result};
use tracing::{debug, info};

use crate::storage::Storage;
use crate::types::error::S3mirrorError;
use crate::types::{ObjectDescriptor, normalize_e_tag};

/// Server-side copy of one object followed by a re-read of the destination.
pub struct CopyVerifier {
    source: Storage,
    target: Storage,
}

impl CopyVerifier {
    pub fn new(source: Storage, target: Storage) -> Self {
        Self { source, target }
    }

    /// Copies `source_object` into the target bucket under the same key, then compares the
    /// destination's size and ETag against the listed ones. A mismatch is an error even
    /// though the copy itself succeeded.
    pub async fn copy_and_verify(&self, source_object: &ObjectDescriptor) -> Result<()> {
        let key = source_object.key();

        let source_head = self
            .source
            .head_object(key)
            .await
            .with_context(|| format!("failed to get source object metadata. key={key}."))?;
        let storage_class = source_head.storage_class().cloned();
        let metadata_count = source_head.metadata().map_or(0, |metadata| metadata.len());

        let source_tagging = self
            .source
            .get_object_tagging(key)
            .await
            .with_context(|| format!("failed to get source object tagging. key={key}."))?;

        debug!(
            key = key,
            storage_class = storage_class.as_ref().map(|class| class.as_str()),
            metadata_count = metadata_count,
            tag_count = source_tagging.tag_set().len(),
            "source object attributes fetched."
        );

        self.target
            .copy_object_from(self.source.bucket(), key, storage_class)
            .await
            .with_context(|| format!("failed to copy object. key={key}."))?;

        let target_head = self
            .target
            .head_object(key)
            .await
            .with_context(|| format!("failed to get copied object metadata. key={key}."))?;
        let target_size = target_head.content_length().unwrap_or_default();
        let target_e_tag = target_head.e_tag().unwrap_or_default();

        if source_object.size() != target_size
            || normalize_e_tag(source_object.e_tag()) != normalize_e_tag(target_e_tag)
        {
            return Err(S3mirrorError::VerificationFailed {
                key: key.to_string(),
                source_size: source_object.size(),
                target_size,
                source_e_tag: source_object.e_tag().to_string(),
                target_e_tag: target_e_tag.to_string(),
            }
            .into());
        }

        info!(
            key = key,
            size = target_size,
            e_tag = target_e_tag,
            "object copied and verified."
        );

        Ok(())
    }
}
