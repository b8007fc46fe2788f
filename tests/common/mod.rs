#![allow(dead_code)]

use std::collections::HashMap;
use std::io::Write;
use std::sync::Arc;

use async_channel::Receiver;
use aws_config::BehaviorVersion;
use aws_config::meta::region::RegionProviderChain;
use aws_sdk_s3::client::Client;
use aws_sdk_s3::config::Builder;
use aws_sdk_s3::operation::head_object::HeadObjectOutput;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::types::{
    BucketLifecycleConfiguration, BucketLocationConstraint, BucketVersioningStatus,
    CreateBucketConfiguration, ExpirationStatus, LifecycleExpiration, LifecycleRule,
    LifecycleRuleFilter, Object, StorageClass, Tag, VersioningConfiguration,
};
use aws_types::region::Region;
use once_cell::sync::Lazy;
use tempfile::NamedTempFile;
use tokio::sync::Semaphore;
use uuid::Uuid;

use s3mirror::Config;
use s3mirror::config::args::parse_from_args;
use s3mirror::pipeline::Pipeline;
use s3mirror::types::error::SyncFailure;
use s3mirror::types::token::create_pipeline_cancellation_token;
use s3mirror::types::{SyncReport, SyncStatistics};

pub const REGION: &str = "ap-northeast-1";

pub const TEST_TAGGING: &str = "tag1=tag_value1&tag2=tag_value2";
pub static TEST_METADATA: Lazy<HashMap<String, String>> = Lazy::new(|| {
    HashMap::from([
        ("key1".to_string(), "value1".to_string()),
        ("key2".to_string(), "value2".to_string()),
    ])
});

pub static BUCKET1: Lazy<String> = Lazy::new(|| format!("s3mirror-e2e-1-{}", Uuid::new_v4()));
pub static BUCKET2: Lazy<String> = Lazy::new(|| format!("s3mirror-e2e-2-{}", Uuid::new_v4()));

pub static SEMAPHORE: Lazy<Arc<Semaphore>> = Lazy::new(|| Arc::new(Semaphore::new(1)));

pub const SLEEP_SECS_BEFORE_RESYNC: u64 = 5;

// credentials come from the default chain, e.g. AWS_PROFILE.
pub struct TestHelper {
    client: Client,
}

#[derive(Debug, Default, PartialEq, Eq)]
pub struct StatsCount {
    pub source_listed: u64,
    pub sync_complete: u64,
    pub sync_skip: u64,
    pub sync_error: u64,
}

impl TestHelper {
    pub async fn new() -> Self {
        Self {
            client: Self::create_client().await,
        }
    }

    pub async fn create_client() -> Client {
        let sdk_config = aws_config::defaults(BehaviorVersion::latest())
            .region(RegionProviderChain::first_try(Region::new(REGION)))
            .load()
            .await;

        Client::from_conf(Builder::from(&sdk_config).build())
    }

    pub async fn create_bucket(&self, bucket: &str, region: &str) {
        let cfg = CreateBucketConfiguration::builder()
            .location_constraint(BucketLocationConstraint::from(region))
            .build();

        self.client
            .create_bucket()
            .create_bucket_configuration(cfg)
            .bucket(bucket)
            .send()
            .await
            .unwrap();
    }

    pub async fn is_bucket_exist(&self, bucket: &str) -> bool {
        let head_bucket_result = self.client.head_bucket().bucket(bucket).send().await;

        if head_bucket_result.is_ok() {
            return true;
        }

        !head_bucket_result
            .err()
            .unwrap()
            .into_service_error()
            .is_not_found()
    }

    pub async fn delete_bucket_with_cascade(&self, bucket: &str) {
        if !self.is_bucket_exist(bucket).await {
            return;
        }

        self.delete_all_objects(bucket).await;

        self.client
            .delete_bucket()
            .bucket(bucket)
            .send()
            .await
            .unwrap();
    }

    pub async fn delete_all_objects(&self, bucket: &str) {
        for object in self.list_objects(bucket).await {
            self.client
                .delete_object()
                .bucket(bucket)
                .key(object.key().unwrap())
                .send()
                .await
                .unwrap();
        }
    }

    pub async fn list_objects(&self, bucket: &str) -> Vec<Object> {
        let mut objects = vec![];
        let mut continuation_token = None;
        loop {
            let output = self
                .client
                .list_objects_v2()
                .bucket(bucket)
                .set_continuation_token(continuation_token)
                .send()
                .await
                .unwrap();
            objects.extend_from_slice(output.contents());

            match output.next_continuation_token() {
                Some(token) => continuation_token = Some(token.to_string()),
                None => return objects,
            }
        }
    }

    pub async fn head_object(&self, bucket: &str, key: &str) -> HeadObjectOutput {
        self.client
            .head_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await
            .unwrap()
    }

    pub async fn get_object_tags(&self, bucket: &str, key: &str) -> HashMap<String, String> {
        let output = self
            .client
            .get_object_tagging()
            .bucket(bucket)
            .key(key)
            .send()
            .await
            .unwrap();

        Self::tag_set_to_map(output.tag_set())
    }

    pub async fn put_object(&self, bucket: &str, key: &str, body: &str) {
        self.client
            .put_object()
            .bucket(bucket)
            .key(key)
            .body(ByteStream::from(body.as_bytes().to_vec()))
            .send()
            .await
            .unwrap();
    }

    pub async fn put_object_with_attributes(&self, bucket: &str, key: &str, body: &str) {
        self.client
            .put_object()
            .bucket(bucket)
            .key(key)
            .body(ByteStream::from(body.as_bytes().to_vec()))
            .set_metadata(Some(TEST_METADATA.clone()))
            .tagging(TEST_TAGGING)
            .storage_class(StorageClass::StandardIa)
            .send()
            .await
            .unwrap();
    }

    pub async fn put_bucket_policy(&self, bucket: &str, policy: &str) {
        self.client
            .put_bucket_policy()
            .bucket(bucket)
            .policy(policy)
            .send()
            .await
            .unwrap();
    }

    pub async fn get_bucket_policy(&self, bucket: &str) -> Option<String> {
        self.client
            .get_bucket_policy()
            .bucket(bucket)
            .send()
            .await
            .ok()
            .and_then(|output| output.policy().map(|policy| policy.to_string()))
    }

    pub async fn enable_bucket_versioning(&self, bucket: &str) {
        self.client
            .put_bucket_versioning()
            .bucket(bucket)
            .versioning_configuration(
                VersioningConfiguration::builder()
                    .status(BucketVersioningStatus::Enabled)
                    .build(),
            )
            .send()
            .await
            .unwrap();
    }

    pub async fn get_bucket_versioning(&self, bucket: &str) -> Option<BucketVersioningStatus> {
        self.client
            .get_bucket_versioning()
            .bucket(bucket)
            .send()
            .await
            .unwrap()
            .status()
            .cloned()
    }

    pub async fn put_expiration_rule(&self, bucket: &str, prefix: &str, days: i32) {
        let rule = LifecycleRule::builder()
            .id("expire")
            .status(ExpirationStatus::Enabled)
            .filter(LifecycleRuleFilter::builder().prefix(prefix).build())
            .expiration(LifecycleExpiration::builder().days(days).build())
            .build()
            .unwrap();

        self.client
            .put_bucket_lifecycle_configuration()
            .bucket(bucket)
            .lifecycle_configuration(
                BucketLifecycleConfiguration::builder()
                    .rules(rule)
                    .build()
                    .unwrap(),
            )
            .send()
            .await
            .unwrap();
    }

    pub async fn get_lifecycle_rules(&self, bucket: &str) -> Vec<LifecycleRule> {
        self.client
            .get_bucket_lifecycle_configuration()
            .bucket(bucket)
            .send()
            .await
            .map(|output| output.rules().to_vec())
            .unwrap_or_default()
    }

    pub fn write_config_file(source_bucket: &str, target_bucket: &str) -> NamedTempFile {
        let mut config_file = NamedTempFile::new().unwrap();
        write!(
            config_file,
            r#"{{
                "source": {{"region": "{REGION}", "bucket": "{source_bucket}"}},
                "destination": {{"region": "{REGION}", "bucket": "{target_bucket}"}},
                "concurrency": 4
            }}"#
        )
        .unwrap();
        config_file
    }

    pub async fn run_mirror(
        source_bucket: &str,
        target_bucket: &str,
        extra_args: &[&str],
    ) -> (Result<SyncReport, SyncFailure>, StatsCount) {
        let config_file = Self::write_config_file(source_bucket, target_bucket);
        let mut args = vec!["s3mirror", "--config", config_file.path().to_str().unwrap()];
        args.extend_from_slice(extra_args);

        let config = Config::try_from(parse_from_args(args).unwrap()).unwrap();
        let mut pipeline = Pipeline::new(config, create_pipeline_cancellation_token()).await;
        let stats_receiver = pipeline.get_stats_receiver();

        let result = pipeline.run().await;
        (result, Self::get_stats_count(stats_receiver))
    }

    pub fn tag_set_to_map(tag_set: &[Tag]) -> HashMap<String, String> {
        tag_set
            .iter()
            .map(|tag| (tag.key().to_string(), tag.value().to_string()))
            .collect()
    }

    pub fn get_stats_count(stats_receiver: Receiver<SyncStatistics>) -> StatsCount {
        let mut stats_count = StatsCount::default();

        while let Ok(sync_stats) = stats_receiver.try_recv() {
            match sync_stats {
                SyncStatistics::SourceListed { total } => stats_count.source_listed = total,
                SyncStatistics::SyncComplete { .. } => stats_count.sync_complete += 1,
                SyncStatistics::SyncSkip { .. } => stats_count.sync_skip += 1,
                SyncStatistics::SyncError { .. } => stats_count.sync_error += 1,
            }
        }

        stats_count
    }

    pub fn init_dummy_tracing_subscriber() {
        let _ = tracing_subscriber::fmt()
            .with_env_filter("dummy=trace")
            .try_init();
    }
}
