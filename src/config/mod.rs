use crate::types::S3Credentials;

pub mod args;

#[derive(Debug, Clone)]
pub struct Config {
    pub source: BucketConfig,
    pub target: BucketConfig,
    pub concurrency: usize,
    pub max_keys: i32,
    pub dry_run: bool,
    pub show_no_progress: bool,
    pub tracing_config: Option<TracingConfig>,
}

/// One side of the mirror: a bucket and how to reach it.
#[derive(Debug, Clone)]
pub struct BucketConfig {
    pub bucket: String,
    pub client_config: ClientConfig,
}

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub credential: S3Credentials,
    pub region: Option<String>,
    pub endpoint_url: Option<String>,
    pub force_path_style: bool,
    pub retry_config: RetryConfig,
}

#[derive(Debug, Clone)]
pub struct RetryConfig {
    pub aws_max_attempts: u32,
    pub initial_backoff_milliseconds: u64,
}

#[derive(Debug, Clone, Copy)]
pub struct TracingConfig {
    pub tracing_level: log::Level,
    pub json_tracing: bool,
    pub aws_sdk_tracing: bool,
    pub span_events_tracing: bool,
    pub disable_color_tracing: bool,
}
