use anyhow::{Result, anyhow};
use tokio::time::Instant;
use tracing::{error, info, trace, warn};

use s3mirror::Config;
use s3mirror::pipeline::Pipeline;
use s3mirror::types::token::create_pipeline_cancellation_token;
use s3mirror::types::{SYNC_SUMMARY_NAME, SyncReport};

mod ctrl_c_handler;
mod indicator;
mod ui_config;

pub async fn run(config: Config) -> Result<()> {
    let cancellation_token = create_pipeline_cancellation_token();

    ctrl_c_handler::spawn_ctrl_c_handler(cancellation_token.clone());

    let start_time = Instant::now();
    trace!("mirror pipeline start.");

    let mut pipeline = Pipeline::new(config.clone(), cancellation_token).await;
    let indicator_join_handle = indicator::show_indicator(
        pipeline.get_stats_receiver(),
        ui_config::is_progress_indicator_needed(&config),
        ui_config::is_show_result_needed(&config),
        config.dry_run,
    );

    let result = pipeline.run().await;
    indicator_join_handle.await?;

    let duration_sec = format!("{:.3}", start_time.elapsed().as_secs_f32());
    match result {
        Ok(report) => {
            show_sync_report_summary(&report, &duration_sec);
            trace!(duration_sec = duration_sec, "s3mirror has been completed.");

            Ok(())
        }
        Err(failure) => {
            show_sync_report_summary(&failure.report, &duration_sec);
            if failure.is_cancelled() {
                warn!(duration_sec = duration_sec, "s3mirror cancelled.");
            } else {
                error!(duration_sec = duration_sec, "s3mirror failed.");
            }

            Err(anyhow!(failure))
        }
    }
}

fn show_sync_report_summary(report: &SyncReport, duration_sec: &str) {
    info!(
        name = SYNC_SUMMARY_NAME,
        total = report.total,
        copied = report.copied,
        skipped = report.skipped,
        failed = report.failed,
        duration_sec = duration_sec,
    );
}
