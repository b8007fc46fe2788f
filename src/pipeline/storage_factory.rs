use crate::Config;
use crate::storage::s3::S3StorageFactory;
use crate::storage::{StorageFactory, StoragePair};

pub async fn create_storage_pair(config: &Config) -> StoragePair {
    let (source, target) = tokio::join!(
        S3StorageFactory::create(config.source.clone()),
        S3StorageFactory::create(config.target.clone())
    );

    StoragePair { source, target }
}
