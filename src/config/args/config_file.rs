use std::path::Path;

use serde::Deserialize;

pub const DEFAULT_CONCURRENCY: usize = 10;
pub const DEFAULT_MAX_RETRIES: u32 = 3;
// same upper bound as `--concurrency`.
pub const MAX_CONCURRENCY: usize = u16::MAX as usize;

/// On-disk JSON configuration.
///
/// ```json
/// {
///   "source": { "access_key": "..", "secret_key": "..", "region": "us-east-1", "bucket": "src" },
///   "destination": { "access_key": "..", "secret_key": "..", "region": "eu-west-1", "bucket": "dst" },
///   "concurrency": 10,
///   "max_retries": 3
/// }
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct ConfigFile {
    pub source: AccountFile,
    pub destination: AccountFile,
    #[serde(default)]
    pub concurrency: Option<i64>,
    #[serde(default)]
    pub max_retries: Option<i64>,
}

#[derive(Clone, Deserialize)]
pub struct AccountFile {
    #[serde(default)]
    pub access_key: Option<String>,
    #[serde(default)]
    pub secret_key: Option<String>,
    #[serde(default)]
    pub region: Option<String>,
    pub bucket: String,
}

impl std::fmt::Debug for AccountFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccountFile")
            .field("access_key", &self.access_key)
            .field("secret_key", &self.secret_key.as_ref().map(|_| "** redacted **"))
            .field("region", &self.region)
            .field("bucket", &self.bucket)
            .finish()
    }
}

impl ConfigFile {
    pub fn load(path: &Path) -> Result<Self, String> {
        let data = std::fs::read_to_string(path).map_err(|e| {
            format!(
                "failed to read config file {}: {e}\n",
                path.to_string_lossy()
            )
        })?;

        Self::parse(&data)
    }

    pub fn parse(data: &str) -> Result<Self, String> {
        let config_file: ConfigFile =
            serde_json::from_str(data).map_err(|e| format!("failed to parse config: {e}\n"))?;

        if config_file.source.bucket.is_empty() {
            return Err("source bucket must not be empty\n".to_string());
        }
        if config_file.destination.bucket.is_empty() {
            return Err("destination bucket must not be empty\n".to_string());
        }

        Ok(config_file)
    }

    pub fn concurrency(&self) -> usize {
        match self.concurrency {
            Some(concurrency) if 0 < concurrency => {
                usize::try_from(concurrency).map_or(MAX_CONCURRENCY, |c| c.min(MAX_CONCURRENCY))
            }
            _ => DEFAULT_CONCURRENCY,
        }
    }

    pub fn max_retries(&self) -> u32 {
        match self.max_retries {
            Some(max_retries) if 0 < max_retries => {
                u32::try_from(max_retries).unwrap_or(u32::MAX)
            }
            _ => DEFAULT_MAX_RETRIES,
        }
    }
}
