use std::ffi::OsString;
use std::path::PathBuf;

use clap::Parser;
use clap::builder::NonEmptyStringValueParser;
use clap_verbosity_flag::{Verbosity, WarnLevel};

use crate::Config;
use crate::config::args::config_file::{AccountFile, ConfigFile};
use crate::config::{BucketConfig, ClientConfig, RetryConfig, TracingConfig};
use crate::types::{AccessKeys, S3Credentials};

pub mod config_file;
mod tests;

const DEFAULT_CONFIG_FILE: &str = ".config.json";
const DEFAULT_MAX_KEYS: i32 = 1000;
const DEFAULT_INITIAL_BACKOFF_MILLISECONDS: u64 = 100;
const DEFAULT_FORCE_PATH_STYLE: bool = false;
const DEFAULT_DRY_RUN: bool = false;
const DEFAULT_SHOW_NO_PROGRESS: bool = false;
const DEFAULT_JSON_TRACING: bool = false;
const DEFAULT_AWS_SDK_TRACING: bool = false;
const DEFAULT_SPAN_EVENTS_TRACING: bool = false;
const DEFAULT_DISABLE_COLOR_TRACING: bool = false;

const SOURCE_CREDENTIAL_INCOMPLETE: &str =
    "source access_key and secret_key must be specified together\n";
const DESTINATION_CREDENTIAL_INCOMPLETE: &str =
    "destination access_key and secret_key must be specified together\n";

#[derive(Parser, Clone, Debug)]
#[command(version, about)]
pub struct CLIArgs {
    /// path to the JSON configuration file
    #[arg(long, env = "S3MIRROR_CONFIG", default_value = DEFAULT_CONFIG_FILE, value_name = "FILE", help_heading = "General")]
    config: PathBuf,

    /// A simulation mode. bucket configuration and objects are inspected but nothing is written
    #[arg(long, env, default_value_t = DEFAULT_DRY_RUN, help_heading = "General")]
    dry_run: bool,

    /// don't show the progress bar
    #[arg(long, env, default_value_t = DEFAULT_SHOW_NO_PROGRESS, help_heading = "General")]
    show_no_progress: bool,

    /// number of objects copied in parallel. overrides `concurrency` in the configuration file
    #[arg(long, env, value_parser = clap::value_parser!(u16).range(1..), help_heading = "Performance")]
    concurrency: Option<u16>,

    /// maximum retry attempts that an s3 client will do. overrides `max_retries` in the configuration file
    #[arg(long, env, value_parser = clap::value_parser!(u32).range(1..), help_heading = "Retry Options")]
    max_retries: Option<u32>,

    /// a multiplier value used when calculating backoff times as part of an exponential backoff with jitter strategy.
    #[arg(long, env, default_value_t = DEFAULT_INITIAL_BACKOFF_MILLISECONDS, value_name = "initial_backoff", help_heading = "Retry Options")]
    initial_backoff_milliseconds: u64,

    /// source endpoint url, for S3-compatible storage
    #[arg(long, env, value_parser = NonEmptyStringValueParser::new(), help_heading = "Source Options")]
    source_endpoint_url: Option<String>,

    /// force path-style addressing for source endpoint
    #[arg(long, env, default_value_t = DEFAULT_FORCE_PATH_STYLE, help_heading = "Source Options")]
    source_force_path_style: bool,

    /// destination endpoint url, for S3-compatible storage
    #[arg(long, env, value_parser = NonEmptyStringValueParser::new(), help_heading = "Destination Options")]
    target_endpoint_url: Option<String>,

    /// force path-style addressing for destination endpoint
    #[arg(long, env, default_value_t = DEFAULT_FORCE_PATH_STYLE, help_heading = "Destination Options")]
    target_force_path_style: bool,

    /// trace verbosity(-v: show info, -vv: show debug, -vvv show trace)
    #[clap(flatten)]
    verbosity: Verbosity<WarnLevel>,

    /// show trace as json format
    #[arg(long, env, default_value_t = DEFAULT_JSON_TRACING, help_heading = "Tracing/Logging")]
    json_tracing: bool,

    /// enable aws sdk tracing
    #[arg(long, env, default_value_t = DEFAULT_AWS_SDK_TRACING, help_heading = "Tracing/Logging")]
    aws_sdk_tracing: bool,

    /// show span event tracing
    #[arg(long, env, default_value_t = DEFAULT_SPAN_EVENTS_TRACING, help_heading = "Tracing/Logging")]
    span_events_tracing: bool,

    /// disable ANSI terminal colors
    #[arg(long, env, default_value_t = DEFAULT_DISABLE_COLOR_TRACING, help_heading = "Tracing/Logging")]
    disable_color_tracing: bool,

    /// maximum number of objects returned in a single list object request
    #[arg(long, env, default_value_t = DEFAULT_MAX_KEYS, value_parser = clap::value_parser!(i32).range(1..=32767), help_heading = "Advanced")]
    max_keys: i32,
}

pub fn parse_from_args<I, T>(args: I) -> Result<CLIArgs, clap::Error>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    CLIArgs::try_parse_from(args)
}

pub fn build_config_from_args<I, T>(args: I) -> Result<Config, String>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let config_args = CLIArgs::try_parse_from(args).map_err(|e| e.to_string())?;
    crate::Config::try_from(config_args)
}

impl CLIArgs {
    fn build_tracing_config(&self) -> Option<TracingConfig> {
        let tracing_config = self
            .verbosity
            .log_level()
            .map(|log_level| TracingConfig {
                tracing_level: log_level,
                json_tracing: self.json_tracing,
                aws_sdk_tracing: self.aws_sdk_tracing,
                span_events_tracing: self.span_events_tracing,
                disable_color_tracing: self.disable_color_tracing,
            });

        if !self.dry_run {
            return tracing_config;
        }

        // dry-run results are reported through info level events.
        match tracing_config {
            None => Some(TracingConfig {
                tracing_level: log::Level::Info,
                json_tracing: DEFAULT_JSON_TRACING,
                aws_sdk_tracing: DEFAULT_AWS_SDK_TRACING,
                span_events_tracing: DEFAULT_SPAN_EVENTS_TRACING,
                disable_color_tracing: DEFAULT_DISABLE_COLOR_TRACING,
            }),
            Some(tracing_config) if tracing_config.tracing_level < log::Level::Info => {
                Some(TracingConfig {
                    tracing_level: log::Level::Info,
                    ..tracing_config
                })
            }
            tracing_config => tracing_config,
        }
    }

    fn build_bucket_config(
        &self,
        account: &AccountFile,
        max_retries: u32,
        endpoint_url: Option<String>,
        force_path_style: bool,
        credential_error: &str,
    ) -> Result<BucketConfig, String> {
        let credential = match (&account.access_key, &account.secret_key) {
            (Some(access_key), Some(secret_key)) => S3Credentials::Credentials {
                access_keys: AccessKeys {
                    access_key: access_key.clone(),
                    secret_access_key: secret_key.clone(),
                },
            },
            (None, None) => S3Credentials::FromEnvironment,
            _ => return Err(credential_error.to_string()),
        };

        let region = account
            .region
            .as_ref()
            .filter(|region| !region.is_empty())
            .cloned();

        Ok(BucketConfig {
            bucket: account.bucket.clone(),
            client_config: ClientConfig {
                credential,
                region,
                endpoint_url,
                force_path_style,
                retry_config: RetryConfig {
                    aws_max_attempts: max_retries,
                    initial_backoff_milliseconds: self.initial_backoff_milliseconds,
                },
            },
        })
    }
}

impl TryFrom<CLIArgs> for Config {
    type Error = String;

    fn try_from(value: CLIArgs) -> Result<Self, Self::Error> {
        let config_file = ConfigFile::load(&value.config)?;
        Config::from_args_and_file(value, config_file)
    }
}

impl Config {
    pub fn from_args_and_file(value: CLIArgs, config_file: ConfigFile) -> Result<Self, String> {
        let concurrency = value
            .concurrency
            .map(usize::from)
            .unwrap_or_else(|| config_file.concurrency());
        let max_retries = value
            .max_retries
            .unwrap_or_else(|| config_file.max_retries());

        let source = value.build_bucket_config(
            &config_file.source,
            max_retries,
            value.source_endpoint_url.clone(),
            value.source_force_path_style,
            SOURCE_CREDENTIAL_INCOMPLETE,
        )?;
        let target = value.build_bucket_config(
            &config_file.destination,
            max_retries,
            value.target_endpoint_url.clone(),
            value.target_force_path_style,
            DESTINATION_CREDENTIAL_INCOMPLETE,
        )?;

        Ok(Config {
            source,
            target,
            concurrency,
            max_keys: value.max_keys,
            dry_run: value.dry_run,
            show_no_progress: value.show_no_progress,
            tracing_config: value.build_tracing_config(),
        })
    }
}
