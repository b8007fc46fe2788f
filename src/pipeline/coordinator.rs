use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use anyhow::{Error, anyhow};
use tokio::sync::Semaphore;
use tokio::task::{JoinError, JoinSet};
use tracing::{debug, error, trace};

use super::stage::Stage;
use super::syncer::ObjectSyncer;
use crate::types::error::{S3mirrorError, SyncFailure, SyncPhase};
use crate::types::{ObjectDescriptor, ObjectOutcome, SyncCounters, SyncReport, SyncStatistics};

type ObjectErrors = Arc<Mutex<VecDeque<(Option<String>, Error)>>>;

/// Runs one [`ObjectSyncer`] per listed object with at most `concurrency` in flight.
///
/// The first failure cancels the shared token: no further objects are admitted, while
/// units already running are awaited before the result is returned.
pub struct SyncCoordinator {
    base: Stage,
}

impl SyncCoordinator {
    pub fn new(base: Stage) -> Self {
        Self { base }
    }

    pub async fn sync_objects(
        &self,
        objects: Vec<ObjectDescriptor>,
    ) -> Result<SyncReport, SyncFailure> {
        let total = objects.len() as u64;
        let counters = Arc::new(SyncCounters::new(total));
        let errors: ObjectErrors = Arc::new(Mutex::new(VecDeque::new()));
        let semaphore = Arc::new(Semaphore::new(
            self.base.config.concurrency.clamp(1, Semaphore::MAX_PERMITS),
        ));
        let syncer = Arc::new(ObjectSyncer::new(&self.base));

        let mut join_set = JoinSet::new();
        let mut admitted: u64 = 0;

        for source_object in objects {
            let permit = tokio::select! {
                biased;
                _ = self.base.cancellation_token.cancelled() => {
                    debug!(admitted = admitted, total = total, "object admission stopped.");
                    break;
                }
                permit = semaphore.clone().acquire_owned() => match permit {
                    Ok(permit) => permit,
                    Err(_) => break,
                },
            };
            admitted += 1;

            while let Some(result) = join_set.try_join_next() {
                handle_join_result(&self.base, &counters, &errors, result);
            }

            let base = self.base.clone();
            let syncer = syncer.clone();
            let counters = counters.clone();
            let errors = errors.clone();
            join_set.spawn(async move {
                let _permit = permit;
                let key = source_object.key().to_string();

                match syncer.sync_object(&source_object).await {
                    Ok(outcome) => finalize(&base, &counters, outcome, key).await,
                    Err(e) => {
                        record_error(&base, &errors, Some(key.clone()), e);
                        finalize(&base, &counters, ObjectOutcome::Failed, key).await;
                    }
                }
            });
        }

        while let Some(result) = join_set.join_next().await {
            handle_join_result(&self.base, &counters, &errors, result);
        }
        trace!(admitted = admitted, total = total, "all object sync units finished.");

        let report = counters.snapshot();
        let first_error = errors.lock().unwrap().pop_front();
        if let Some((key, error)) = first_error {
            return Err(SyncFailure::new(SyncPhase::Object, key, error, report));
        }

        if admitted < total {
            return Err(SyncFailure::new(
                SyncPhase::Object,
                None,
                S3mirrorError::Cancelled.into(),
                report,
            ));
        }

        Ok(report)
    }
}

async fn finalize(base: &Stage, counters: &SyncCounters, outcome: ObjectOutcome, key: String) {
    counters.increment(outcome);

    let stats = match outcome {
        ObjectOutcome::Copied => SyncStatistics::SyncComplete { key },
        ObjectOutcome::Skipped => SyncStatistics::SyncSkip { key },
        ObjectOutcome::Failed => SyncStatistics::SyncError { key },
    };
    base.send_stats(stats).await;
}

// a panicked unit never reached `finalize`, so it is counted here.
fn handle_join_result(
    base: &Stage,
    counters: &SyncCounters,
    errors: &ObjectErrors,
    result: Result<(), JoinError>,
) {
    if let Err(e) = result {
        counters.increment(ObjectOutcome::Failed);
        record_error(base, errors, None, anyhow!(e));
    }
}

fn record_error(base: &Stage, errors: &ObjectErrors, key: Option<String>, e: Error) {
    let error = format!("{e:#}");
    let source = e.source();
    error!(
        key = key.as_deref(),
        error = error,
        source = source,
        "object sync failed."
    );

    errors.lock().unwrap().push_back((key, e));
    base.cancellation_token.cancel();
}
