use anyhow::Result;
use async_trait::async_trait;
use aws_sdk_s3::operation::copy_object::CopyObjectOutput;
use aws_sdk_s3::operation::get_object_tagging::GetObjectTaggingOutput;
use aws_sdk_s3::operation::head_object::HeadObjectOutput;
use aws_sdk_s3::operation::list_objects_v2::ListObjectsV2Output;
use aws_sdk_s3::types::{BucketVersioningStatus, LifecycleRule, StorageClass};
use dyn_clone::DynClone;

use crate::config::BucketConfig;

pub mod s3;

pub type Storage = Box<dyn StorageTrait + Send + Sync>;

pub struct StoragePair {
    pub source: Storage,
    pub target: Storage,
}

#[async_trait]
pub trait StorageFactory {
    async fn create(bucket_config: BucketConfig) -> Storage;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BucketCreation {
    Created,
    AlreadyOwnedByYou,
    /// The name is taken. Whether this account can write to it is only known by later calls.
    AlreadyExists,
}

/// Operations the mirror needs from one account, bound to one bucket.
///
/// Conditions the service reports as "not configured" or "already exists" are returned as
/// typed values, not errors. Every other failure is an error.
#[async_trait]
pub trait StorageTrait: DynClone {
    fn bucket(&self) -> &str;

    async fn create_bucket(&self) -> Result<BucketCreation>;

    /// `None` when the bucket has no policy.
    async fn get_bucket_policy(&self) -> Result<Option<String>>;
    async fn put_bucket_policy(&self, policy: &str) -> Result<()>;

    /// `None` when versioning has never been enabled on the bucket.
    async fn get_bucket_versioning(&self) -> Result<Option<BucketVersioningStatus>>;
    async fn put_bucket_versioning(&self, status: Option<BucketVersioningStatus>) -> Result<()>;

    /// `None` when the bucket has no lifecycle configuration.
    async fn get_bucket_lifecycle_rules(&self) -> Result<Option<Vec<LifecycleRule>>>;
    async fn put_bucket_lifecycle_rules(&self, rules: Vec<LifecycleRule>) -> Result<()>;

    async fn list_objects_page(
        &self,
        continuation_token: Option<String>,
        max_keys: i32,
    ) -> Result<ListObjectsV2Output>;

    /// A missing object is reported as an error that keeps the SDK's `HeadObjectError`.
    async fn head_object(&self, key: &str) -> Result<HeadObjectOutput>;
    async fn get_object_tagging(&self, key: &str) -> Result<GetObjectTaggingOutput>;

    /// Server-side copy of `source_bucket/key` into this bucket under the same key,
    /// carrying over metadata and tags.
    async fn copy_object_from(
        &self,
        source_bucket: &str,
        key: &str,
        storage_class: Option<StorageClass>,
    ) -> Result<CopyObjectOutput>;
}
