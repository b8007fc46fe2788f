use std::sync::Arc;

use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use aws_sdk_s3::Client;
use aws_sdk_s3::error::{ProvideErrorMetadata, SdkError};
use aws_sdk_s3::operation::copy_object::CopyObjectOutput;
use aws_sdk_s3::operation::create_bucket::CreateBucketError;
use aws_sdk_s3::operation::get_object_tagging::GetObjectTaggingOutput;
use aws_sdk_s3::operation::head_object::HeadObjectOutput;
use aws_sdk_s3::operation::list_objects_v2::ListObjectsV2Output;
use aws_sdk_s3::types::{
    BucketLifecycleConfiguration, BucketLocationConstraint, BucketVersioningStatus,
    CreateBucketConfiguration, LifecycleRule, MetadataDirective, StorageClass, TaggingDirective,
    VersioningConfiguration,
};
use aws_smithy_runtime_api::client::orchestrator::HttpResponse;
use tracing::{debug, trace, warn};

use crate::config::BucketConfig;
use crate::storage::{BucketCreation, Storage, StorageFactory, StorageTrait};

const NO_SUCH_BUCKET_POLICY: &str = "NoSuchBucketPolicy";
const NO_SUCH_LIFECYCLE_CONFIGURATION: &str = "NoSuchLifecycleConfiguration";
const BUCKET_ALREADY_OWNED_BY_YOU: &str = "BucketAlreadyOwnedByYou";
const BUCKET_ALREADY_EXISTS: &str = "BucketAlreadyExists";

// us-east-1 rejects an explicit location constraint.
const DEFAULT_LOCATION_REGION: &str = "us-east-1";

mod client_builder;

pub struct S3StorageFactory {}

#[async_trait]
impl StorageFactory for S3StorageFactory {
    async fn create(bucket_config: BucketConfig) -> Storage {
        let client = bucket_config.client_config.create_client().await;
        S3Storage::boxed_new(bucket_config.bucket, Arc::new(client))
    }
}

#[derive(Clone)]
struct S3Storage {
    bucket: String,
    client: Arc<Client>,
}

impl S3Storage {
    fn boxed_new(bucket: String, client: Arc<Client>) -> Storage {
        Box::new(S3Storage { bucket, client })
    }

    fn build_create_bucket_configuration(&self) -> Option<CreateBucketConfiguration> {
        let region = self.client.config().region()?.to_string();
        if region == DEFAULT_LOCATION_REGION {
            return None;
        }

        Some(
            CreateBucketConfiguration::builder()
                .location_constraint(BucketLocationConstraint::from(region.as_str()))
                .build(),
        )
    }
}

#[async_trait]
impl StorageTrait for S3Storage {
    fn bucket(&self) -> &str {
        &self.bucket
    }

    async fn create_bucket(&self) -> Result<BucketCreation> {
        let result = self
            .client
            .create_bucket()
            .bucket(&self.bucket)
            .set_create_bucket_configuration(self.build_create_bucket_configuration())
            .send()
            .await;

        match result {
            Ok(_) => {
                debug!(bucket = self.bucket, "bucket has been created.");
                Ok(BucketCreation::Created)
            }
            Err(e) => {
                if let Some(creation) = classify_create_bucket_error(&e) {
                    return Ok(creation);
                }

                Err(anyhow!(e)).context("aws_sdk_s3::client::create_bucket() failed.")
            }
        }
    }

    async fn get_bucket_policy(&self) -> Result<Option<String>> {
        let result = self
            .client
            .get_bucket_policy()
            .bucket(&self.bucket)
            .send()
            .await;

        match result {
            Ok(output) => Ok(output.policy().map(|policy| policy.to_string())),
            Err(e) if has_error_code(&e, NO_SUCH_BUCKET_POLICY) => {
                trace!(bucket = self.bucket, "no bucket policy configured.");
                Ok(None)
            }
            Err(e) => Err(anyhow!(e)).context("aws_sdk_s3::client::get_bucket_policy() failed."),
        }
    }

    async fn put_bucket_policy(&self, policy: &str) -> Result<()> {
        self.client
            .put_bucket_policy()
            .bucket(&self.bucket)
            .policy(policy)
            .send()
            .await
            .context("aws_sdk_s3::client::put_bucket_policy() failed.")?;

        Ok(())
    }

    async fn get_bucket_versioning(&self) -> Result<Option<BucketVersioningStatus>> {
        let output = self
            .client
            .get_bucket_versioning()
            .bucket(&self.bucket)
            .send()
            .await
            .context("aws_sdk_s3::client::get_bucket_versioning() failed.")?;

        Ok(output.status().cloned())
    }

    async fn put_bucket_versioning(&self, status: Option<BucketVersioningStatus>) -> Result<()> {
        self.client
            .put_bucket_versioning()
            .bucket(&self.bucket)
            .versioning_configuration(VersioningConfiguration::builder().set_status(status).build())
            .send()
            .await
            .context("aws_sdk_s3::client::put_bucket_versioning() failed.")?;

        Ok(())
    }

    async fn get_bucket_lifecycle_rules(&self) -> Result<Option<Vec<LifecycleRule>>> {
        let result = self
            .client
            .get_bucket_lifecycle_configuration()
            .bucket(&self.bucket)
            .send()
            .await;

        match result {
            Ok(output) => Ok(Some(output.rules().to_vec())),
            Err(e) if has_error_code(&e, NO_SUCH_LIFECYCLE_CONFIGURATION) => {
                trace!(bucket = self.bucket, "no lifecycle configuration.");
                Ok(None)
            }
            Err(e) => Err(anyhow!(e))
                .context("aws_sdk_s3::client::get_bucket_lifecycle_configuration() failed."),
        }
    }

    async fn put_bucket_lifecycle_rules(&self, rules: Vec<LifecycleRule>) -> Result<()> {
        let lifecycle_configuration = BucketLifecycleConfiguration::builder()
            .set_rules(Some(rules))
            .build()
            .context("BucketLifecycleConfiguration::build() failed.")?;

        self.client
            .put_bucket_lifecycle_configuration()
            .bucket(&self.bucket)
            .lifecycle_configuration(lifecycle_configuration)
            .send()
            .await
            .context("aws_sdk_s3::client::put_bucket_lifecycle_configuration() failed.")?;

        Ok(())
    }

    async fn list_objects_page(
        &self,
        continuation_token: Option<String>,
        max_keys: i32,
    ) -> Result<ListObjectsV2Output> {
        self.client
            .list_objects_v2()
            .bucket(&self.bucket)
            .set_continuation_token(continuation_token)
            .max_keys(max_keys)
            .send()
            .await
            .context("aws_sdk_s3::client::list_objects_v2() failed.")
    }

    async fn head_object(&self, key: &str) -> Result<HeadObjectOutput> {
        self.client
            .head_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .context("aws_sdk_s3::client::head_object() failed.")
    }

    async fn get_object_tagging(&self, key: &str) -> Result<GetObjectTaggingOutput> {
        self.client
            .get_object_tagging()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .context("aws_sdk_s3::client::get_object_tagging() failed.")
    }

    async fn copy_object_from(
        &self,
        source_bucket: &str,
        key: &str,
        storage_class: Option<StorageClass>,
    ) -> Result<CopyObjectOutput> {
        self.client
            .copy_object()
            .bucket(&self.bucket)
            .key(key)
            .copy_source(generate_copy_source(source_bucket, key))
            .metadata_directive(MetadataDirective::Copy)
            .tagging_directive(TaggingDirective::Copy)
            .set_storage_class(storage_class)
            .send()
            .await
            .context("aws_sdk_s3::client::copy_object() failed.")
    }
}

pub fn generate_copy_source(source_bucket: &str, key: &str) -> String {
    let encoded_key = key
        .split('/')
        .map(|segment| urlencoding::encode(segment).into_owned())
        .collect::<Vec<String>>()
        .join("/");

    format!("{source_bucket}/{encoded_key}")
}

fn classify_create_bucket_error(
    e: &SdkError<CreateBucketError, HttpResponse>,
) -> Option<BucketCreation> {
    match e.as_service_error()? {
        CreateBucketError::BucketAlreadyOwnedByYou(_) => Some(BucketCreation::AlreadyOwnedByYou),
        CreateBucketError::BucketAlreadyExists(_) => {
            warn!("bucket name is already taken. it may be owned by another account.");
            Some(BucketCreation::AlreadyExists)
        }
        service_error => match service_error.code() {
            // S3-compatible services do not always map these codes to the typed variants.
            Some(BUCKET_ALREADY_OWNED_BY_YOU) => Some(BucketCreation::AlreadyOwnedByYou),
            Some(BUCKET_ALREADY_EXISTS) => {
                warn!("bucket name is already taken. it may be owned by another account.");
                Some(BucketCreation::AlreadyExists)
            }
            _ => None,
        },
    }
}

fn has_error_code<E: ProvideErrorMetadata>(e: &SdkError<E, HttpResponse>, code: &str) -> bool {
    e.as_service_error()
        .and_then(|service_error| service_error.code())
        == Some(code)
}
