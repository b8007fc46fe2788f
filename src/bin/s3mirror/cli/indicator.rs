use std::io;
use std::io::Write;

use async_channel::Receiver;
use indicatif::{HumanCount, HumanDuration, ProgressBar, ProgressStyle};
use s3mirror::types::SyncStatistics;
use simple_moving_average::{SMA, SumTreeSMA};
use tokio::task::JoinHandle;
use tokio::time::Instant;

const MOVING_AVERAGE_PERIOD_SECS: usize = 10;
const REFRESH_INTERVAL: f32 = 1.0;
const PROGRESS_TEMPLATE: &str = "{wide_bar} {pos}/{len} {msg}";

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
struct IndicatorCounts {
    total: u64,
    copied: u64,
    skipped: u64,
    failed: u64,
}

impl IndicatorCounts {
    /// Returns the number of objects copied by this event.
    fn apply(&mut self, sync_stats: SyncStatistics) -> u64 {
        match sync_stats {
            SyncStatistics::SourceListed { total } => self.total = total,
            SyncStatistics::SyncComplete { .. } => {
                self.copied += 1;
                return 1;
            }
            SyncStatistics::SyncSkip { .. } => self.skipped += 1,
            SyncStatistics::SyncError { .. } => self.failed += 1,
        }
        0
    }

    // failed objects are not "done", so they do not advance the bar.
    fn position(&self) -> u64 {
        self.copied + self.skipped
    }
}

pub fn show_indicator(
    stats_receiver: Receiver<SyncStatistics>,
    show_progress: bool,
    show_result: bool,
    dry_run: bool,
) -> JoinHandle<()> {
    let progress_bar = if show_progress {
        ProgressBar::new(0)
    } else {
        ProgressBar::hidden()
    };
    if let Ok(progress_style) = ProgressStyle::with_template(PROGRESS_TEMPLATE) {
        progress_bar.set_style(progress_style);
    }

    tokio::spawn(async move {
        let start_time = Instant::now();

        let mut ma_copied_count = SumTreeSMA::<_, u64, MOVING_AVERAGE_PERIOD_SECS>::new();
        let mut counts = IndicatorCounts::default();

        loop {
            let mut copied_count: u64 = 0;

            let period = Instant::now();
            loop {
                while let Ok(sync_stats) = stats_receiver.try_recv() {
                    copied_count += counts.apply(sync_stats);
                }

                if REFRESH_INTERVAL < period.elapsed().as_secs_f32() {
                    break;
                }

                if stats_receiver.is_closed() {
                    while let Ok(sync_stats) = stats_receiver.try_recv() {
                        counts.apply(sync_stats);
                    }

                    let elapsed = start_time.elapsed();
                    let elapsed_secs_f64 = elapsed.as_secs_f64();

                    let mut objects_per_sec = (counts.copied as f64 / elapsed_secs_f64) as u64;
                    if elapsed_secs_f64 < REFRESH_INTERVAL as f64 {
                        objects_per_sec = counts.copied;
                    }
                    if dry_run {
                        objects_per_sec = 0;
                    }

                    progress_bar.finish_and_clear();

                    if show_result {
                        println!(
                            "copied {} objects | {} objects/sec,  skipped {} objects,  error {} objects,  listed {} objects,  duration {}",
                            counts.copied,
                            HumanCount(objects_per_sec),
                            counts.skipped,
                            counts.failed,
                            counts.total,
                            HumanDuration(elapsed),
                        );
                        let _ = io::stdout().flush();
                    }

                    return;
                }

                tokio::time::sleep(std::time::Duration::from_secs_f32(0.05)).await;
            }

            if !dry_run {
                ma_copied_count.add_sample(copied_count);
            }

            progress_bar.set_length(counts.total);
            progress_bar.set_position(counts.position());
            progress_bar.set_message(format!(
                "{} objects/sec,  skipped {},  error {}",
                HumanCount(ma_copied_count.get_average()),
                counts.skipped,
                counts.failed,
            ));
        }
    })
}
