use async_channel::{Receiver, Sender};
use tracing::{debug, error, info, trace, warn};

use crate::Config;
use crate::pipeline::bucket_config_syncer::BucketConfigSyncer;
use crate::pipeline::coordinator::SyncCoordinator;
use crate::pipeline::lister::ObjectLister;
use crate::pipeline::stage::Stage;
use crate::storage::{Storage, StoragePair};
use crate::types::error::{S3mirrorError, SyncFailure, SyncPhase};
use crate::types::token::PipelineCancellationToken;
use crate::types::{SyncReport, SyncStatistics};

mod bucket_config_syncer;
mod change_detector;
mod coordinator;
mod copy_verifier;
mod lister;
mod stage;
mod storage_factory;
mod syncer;


/// One mirror run: bucket configuration, then the source listing, then the objects.
///
/// Each phase starts only after the previous one succeeded.
pub struct Pipeline {
    config: Config,
    source: Storage,
    target: Storage,
    cancellation_token: PipelineCancellationToken,
    stats_sender: Sender<SyncStatistics>,
    stats_receiver: Receiver<SyncStatistics>,
    ready: bool,
}

impl Pipeline {
    pub async fn new(config: Config, cancellation_token: PipelineCancellationToken) -> Self {
        let storage_pair = storage_factory::create_storage_pair(&config).await;
        Self::with_storage(config, storage_pair, cancellation_token)
    }

    pub fn with_storage(
        config: Config,
        storage_pair: StoragePair,
        cancellation_token: PipelineCancellationToken,
    ) -> Self {
        let (stats_sender, stats_receiver) = async_channel::unbounded();
        let StoragePair { source, target } = storage_pair;

        Self {
            config,
            source,
            target,
            cancellation_token,
            stats_sender,
            stats_receiver,
            ready: true,
        }
    }

    pub async fn run(&mut self) -> Result<SyncReport, SyncFailure> {
        if !self.ready {
            panic!("it can be executed only once.")
        }
        self.ready = false;

        let result = self.run_phases().await;
        self.close_stats_sender();

        match &result {
            Ok(report) => trace!(
                total = report.total,
                copied = report.copied,
                skipped = report.skipped,
                "pipeline has been completed."
            ),
            Err(failure) if failure.is_cancelled() => {
                warn!(phase = failure.phase.to_string(), "pipeline has been cancelled.")
            }
            Err(failure) => error!(
                phase = failure.phase.to_string(),
                key = failure.key.as_deref(),
                error = format!("{:#}", failure.error),
                "pipeline failed."
            ),
        }

        result
    }

    async fn run_phases(&self) -> Result<SyncReport, SyncFailure> {
        self.check_cancelled(SyncPhase::BucketConfig)?;

        info!(
            source = self.source.bucket(),
            target = self.target.bucket(),
            "bucket configuration sync has started."
        );
        let snapshot = BucketConfigSyncer::new(self.create_stage())
            .sync()
            .await
            .map_err(|e| SyncFailure::new(SyncPhase::BucketConfig, None, e, SyncReport::default()))?;
        debug!(
            creation = ?snapshot.creation,
            policy = snapshot.policy.is_some(),
            versioning = ?snapshot.versioning,
            lifecycle_rule_count = snapshot.lifecycle_rules.as_ref().map_or(0, Vec::len),
            "bucket configuration has been synchronized."
        );

        self.check_cancelled(SyncPhase::BucketConfig)?;

        let objects = ObjectLister::new(self.create_stage())
            .list_source(self.config.max_keys)
            .await
            .map_err(|e| SyncFailure::new(SyncPhase::Listing, None, e, SyncReport::default()))?;

        let total = objects.len() as u64;
        info!(total = total, "source objects have been listed.");
        let _ = self
            .stats_sender
            .send(SyncStatistics::SourceListed { total })
            .await;

        SyncCoordinator::new(self.create_stage())
            .sync_objects(objects)
            .await
    }

    fn check_cancelled(&self, phase: SyncPhase) -> Result<(), SyncFailure> {
        if self.cancellation_token.is_cancelled() {
            return Err(SyncFailure::new(
                phase,
                None,
                S3mirrorError::Cancelled.into(),
                SyncReport::default(),
            ));
        }
        Ok(())
    }

    fn create_stage(&self) -> Stage {
        Stage::new(
            self.config.clone(),
            dyn_clone::clone_box(&*self.source),
            dyn_clone::clone_box(&*self.target),
            self.cancellation_token.clone(),
            self.stats_sender.clone(),
        )
    }

    pub fn get_stats_receiver(&self) -> Receiver<SyncStatistics> {
        self.stats_receiver.clone()
    }

    pub fn close_stats_sender(&self) {
        self.stats_sender.close();
    }
}
