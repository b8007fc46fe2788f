use async_channel::Sender;

use crate::Config;
use crate::storage::Storage;
use crate::types::SyncStatistics;
use crate::types::token::PipelineCancellationToken;

/// Everything a pipeline component needs: configuration, both storages, the shared
/// cancellation token and the statistics channel.
pub struct Stage {
    pub config: Config,
    pub source: Storage,
    pub target: Storage,
    pub cancellation_token: PipelineCancellationToken,
    pub stats_sender: Sender<SyncStatistics>,
}

impl Stage {
    pub fn new(
        config: Config,
        source: Storage,
        target: Storage,
        cancellation_token: PipelineCancellationToken,
        stats_sender: Sender<SyncStatistics>,
    ) -> Self {
        Self {
            config,
            source,
            target,
            cancellation_token,
            stats_sender,
        }
    }

    pub async fn send_stats(&self, stats: SyncStatistics) {
        // the receiver may have been dropped by a caller that does not need statistics.
        let _ = self.stats_sender.send(stats).await;
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancellation_token.is_cancelled()
    }
}

impl Clone for Stage {
    fn clone(&self) -> Self {
        Self {
            config: self.config.clone(),
            source: dyn_clone::clone_box(&*self.source),
            target: dyn_clone::clone_box(&*self.target),
            cancellation_token: self.cancellation_token.clone(),
            stats_sender: self.stats_sender.clone(),
        }
    }
}
