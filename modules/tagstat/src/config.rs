use std::env;
use std::time::Duration;

use crate::error::{Result, TagStatsError};

/// Leads requested per page.
pub const PAGE_SIZE: u32 = 50;
/// Lead accumulation stops once this many have been fetched (page granularity).
pub const LEAD_CAP: usize = 250;
/// Number of ranked tags reported individually; the rest fold into `othersCount`.
pub const TOP_N: usize = 10;

/// Fixed sizing parameters for one statistics computation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatsLimits {
    pub page_size: u32,
    pub lead_cap: usize,
    pub top_n: usize,
}

impl Default for StatsLimits {
    fn default() -> Self {
        Self {
            page_size: PAGE_SIZE,
            lead_cap: LEAD_CAP,
            top_n: TOP_N,
        }
    }
}

/// How often a dashboard refresh recomputes statistics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RefreshInterval(Duration);

impl RefreshInterval {
    pub const MIN_SECS: u64 = 30;
    pub const MAX_SECS: u64 = 3600;
    pub const DEFAULT_SECS: u64 = 300;

    pub fn new(secs: u64) -> Result<Self> {
        if !(Self::MIN_SECS..=Self::MAX_SECS).contains(&secs) {
            return Err(TagStatsError::Config(format!(
                "refresh interval must be between {} and {} seconds, got {secs}",
                Self::MIN_SECS,
                Self::MAX_SECS
            )));
        }
        Ok(Self(Duration::from_secs(secs)))
    }

    pub fn as_duration(&self) -> Duration {
        self.0
    }
}

impl Default for RefreshInterval {
    fn default() -> Self {
        Self(Duration::from_secs(Self::DEFAULT_SECS))
    }
}

/// Account credentials for the upstream CRM.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub domain: String,
    pub api_key: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("domain", &self.domain)
            .field("api_key", &preview(&self.api_key))
            .finish()
    }
}

impl Credentials {
    /// Use these credentials if both fields are filled in, otherwise fall back
    /// to the configured account.
    pub fn or_else(self, config: &Config) -> Credentials {
        if self.domain.trim().is_empty() || self.api_key.trim().is_empty() {
            return config.credentials();
        }
        self
    }
}

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    pub kommo_domain: String,
    pub kommo_api_key: String,
    pub refresh_interval: RefreshInterval,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let refresh_interval = match env::var("TAGSTAT_REFRESH_SECS") {
            Ok(raw) => {
                let secs = raw.trim().parse::<u64>().map_err(|_| {
                    TagStatsError::Config(format!("TAGSTAT_REFRESH_SECS must be a number, got {raw:?}"))
                })?;
                RefreshInterval::new(secs)?
            }
            Err(_) => RefreshInterval::default(),
        };

        Ok(Self {
            kommo_domain: required_env("KOMMO_DOMAIN")?,
            kommo_api_key: required_env("KOMMO_API_KEY")?,
            refresh_interval,
        })
    }

    pub fn credentials(&self) -> Credentials {
        Credentials {
            domain: self.kommo_domain.clone(),
            api_key: self.kommo_api_key.clone(),
        }
    }

    pub fn log_redacted(&self) {
        tracing::info!("Config loaded:");
        tracing::info!("  KOMMO_DOMAIN: {}", self.kommo_domain);
        tracing::info!("  KOMMO_API_KEY: {}", preview(&self.kommo_api_key));
        tracing::info!(
            "  TAGSTAT_REFRESH_SECS: {}",
            self.refresh_interval.as_duration().as_secs()
        );
    }
}

fn required_env(key: &str) -> Result<String> {
    match env::var(key) {
        Ok(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(TagStatsError::Config(format!(
            "{key} environment variable is required"
        ))),
    }
}

fn preview(val: &str) -> String {
    let n = val.chars().take(5).map(char::len_utf8).sum::<usize>();
    format!("{}...({} chars)", &val[..n], val.chars().count())
}
