use anyhow::{Context, Result};
use aws_sdk_s3::types::{BucketVersioningStatus, LifecycleRule};
use tracing::{debug, info};

use super::stage::Stage;
use crate::storage::BucketCreation;

/// What was read from the source bucket and applied to the target bucket.
#[derive(Debug, Clone, PartialEq)]
pub struct BucketConfigSnapshot {
    pub creation: Option<BucketCreation>,
    pub policy: Option<String>,
    pub versioning: Option<BucketVersioningStatus>,
    pub lifecycle_rules: Option<Vec<LifecycleRule>>,
}

pub struct BucketConfigSyncer {
    base: Stage,
}

impl BucketConfigSyncer {
    pub fn new(base: Stage) -> Self {
        Self { base }
    }

    /// Ensures the target bucket exists, then copies policy, versioning and lifecycle
    /// from the source in that order. The first failing step ends the sync.
    pub async fn sync(&self) -> Result<BucketConfigSnapshot> {
        let creation = self.ensure_target_bucket().await?;
        let policy = self.sync_policy().await?;
        let versioning = self.sync_versioning().await?;
        let lifecycle_rules = self.sync_lifecycle().await?;

        Ok(BucketConfigSnapshot {
            creation,
            policy,
            versioning,
            lifecycle_rules,
        })
    }

    async fn ensure_target_bucket(&self) -> Result<Option<BucketCreation>> {
        let bucket = self.base.target.bucket();
        if self.base.config.dry_run {
            info!(bucket = bucket, "[dry-run] target bucket would be created.");
            return Ok(None);
        }

        let creation = self
            .base
            .target
            .create_bucket()
            .await
            .with_context(|| format!("failed to create target bucket. bucket={bucket}."))?;

        match creation {
            BucketCreation::Created => info!(bucket = bucket, "target bucket created."),
            BucketCreation::AlreadyOwnedByYou => {
                info!(bucket = bucket, "target bucket already exists.")
            }
            BucketCreation::AlreadyExists => {
                info!(bucket = bucket, "target bucket name is already taken.")
            }
        }

        Ok(Some(creation))
    }

    async fn sync_policy(&self) -> Result<Option<String>> {
        let policy = self
            .base
            .source
            .get_bucket_policy()
            .await
            .with_context(|| {
                format!(
                    "failed to get source bucket policy. bucket={}.",
                    self.base.source.bucket()
                )
            })?;

        let Some(policy) = policy else {
            debug!("source bucket has no policy.");
            return Ok(None);
        };

        if self.base.config.dry_run {
            info!("[dry-run] bucket policy would be copied.");
        } else {
            self.base
                .target
                .put_bucket_policy(&policy)
                .await
                .with_context(|| {
                    format!(
                        "failed to put target bucket policy. bucket={}.",
                        self.base.target.bucket()
                    )
                })?;
            info!("bucket policy copied.");
        }

        Ok(Some(policy))
    }

    async fn sync_versioning(&self) -> Result<Option<BucketVersioningStatus>> {
        let status = self
            .base
            .source
            .get_bucket_versioning()
            .await
            .with_context(|| {
                format!(
                    "failed to get source bucket versioning. bucket={}.",
                    self.base.source.bucket()
                )
            })?;

        let status_name = status.as_ref().map(|status| status.as_str());
        if self.base.config.dry_run {
            info!(status = status_name, "[dry-run] bucket versioning would be copied.");
        } else {
            self.base
                .target
                .put_bucket_versioning(status.clone())
                .await
                .with_context(|| {
                    format!(
                        "failed to put target bucket versioning. bucket={}.",
                        self.base.target.bucket()
                    )
                })?;
            info!(status = status_name, "bucket versioning copied.");
        }

        Ok(status)
    }

    async fn sync_lifecycle(&self) -> Result<Option<Vec<LifecycleRule>>> {
        let rules = self
            .base
            .source
            .get_bucket_lifecycle_rules()
            .await
            .with_context(|| {
                format!(
                    "failed to get source bucket lifecycle configuration. bucket={}.",
                    self.base.source.bucket()
                )
            })?;

        let rules = match rules {
            Some(rules) if !rules.is_empty() => rules,
            _ => {
                debug!("source bucket has no lifecycle rules.");
                return Ok(None);
            }
        };

        if self.base.config.dry_run {
            info!(rule_count = rules.len(), "[dry-run] lifecycle rules would be copied.");
        } else {
            self.base
                .target
                .put_bucket_lifecycle_rules(rules.clone())
                .await
                .with_context(|| {
                    format!(
                        "failed to put target bucket lifecycle configuration. bucket={}.",
                        self.base.target.bucket()
                    )
                })?;
            info!(rule_count = rules.len(), "lifecycle rules copied.");
        }

        Ok(Some(rules))
    }
}
