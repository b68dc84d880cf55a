// Native host settings for the dashboard poller and the data-file loaders.
// See DESIGN.md: config

use std::path::PathBuf;
use std::time::Duration;

use crate::dashboard::Endpoint;
use crate::error::EngineError;

/// Dashboard host configuration loaded from environment variables.
///
/// All fields have defaults suitable for a local Mission Control dev server.
#[derive(Debug, Clone, PartialEq)]
pub struct DashboardConfig {
    /// Mission Control base URL (default: `http://localhost:3000`).
    pub base_url: String,
    /// Directory holding `profile.json` and `website-stats.json` (default: `data`).
    pub data_root: PathBuf,
    pub nio_status_interval: Duration,
    pub system_metrics_interval: Duration,
    pub session_status_interval: Duration,
    pub memories_interval: Duration,
    pub request_timeout: Duration,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        let interval = |e: Endpoint| e.default_interval().unwrap_or(Duration::from_secs(300));
        DashboardConfig {
            base_url: "http://localhost:3000".to_string(),
            data_root: PathBuf::from("data"),
            nio_status_interval: interval(Endpoint::NioStatus),
            system_metrics_interval: interval(Endpoint::SystemMetrics),
            session_status_interval: interval(Endpoint::SessionStatus),
            memories_interval: interval(Endpoint::EnhancedData),
            request_timeout: Duration::from_secs(30),
        }
    }
}

impl DashboardConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                        | Default                 |
    /// |--------------------------------|-------------------------|
    /// | `MISSION_CONTROL_URL`          | `http://localhost:3000` |
    /// | `REEL_DATA_ROOT`               | `data`                  |
    /// | `NIO_STATUS_INTERVAL_SECS`     | `43200`                 |
    /// | `SYSTEM_METRICS_INTERVAL_SECS` | `300`                   |
    /// | `SESSION_STATUS_INTERVAL_SECS` | `300`                   |
    /// | `MEMORIES_INTERVAL_SECS`       | `600`                   |
    /// | `REQUEST_TIMEOUT_SECS`         | `30`                    |
    pub fn from_env() -> Result<Self, EngineError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) with an injectable variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, EngineError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = DashboardConfig::default();
        let secs = |key: &str, default: Duration| -> Result<Duration, EngineError> {
            match lookup(key) {
                None => Ok(default),
                Some(raw) => match raw.trim().parse::<u64>() {
                    Ok(0) => Err(EngineError::InvalidConfig(format!(
                        "{} must be greater than zero",
                        key
                    ))),
                    Ok(n) => Ok(Duration::from_secs(n)),
                    Err(_) => Err(EngineError::InvalidConfig(format!(
                        "{} must be a whole number of seconds, got '{}'",
                        key, raw
                    ))),
                },
            }
        };

        Ok(DashboardConfig {
            base_url: lookup("MISSION_CONTROL_URL")
                .map(|url| url.trim_end_matches('/').to_string())
                .unwrap_or(defaults.base_url),
            data_root: lookup("REEL_DATA_ROOT")
                .map(PathBuf::from)
                .unwrap_or(defaults.data_root),
            nio_status_interval: secs("NIO_STATUS_INTERVAL_SECS", defaults.nio_status_interval)?,
            system_metrics_interval: secs(
                "SYSTEM_METRICS_INTERVAL_SECS",
                defaults.system_metrics_interval,
            )?,
            session_status_interval: secs(
                "SESSION_STATUS_INTERVAL_SECS",
                defaults.session_status_interval,
            )?,
            memories_interval: secs("MEMORIES_INTERVAL_SECS", defaults.memories_interval)?,
            request_timeout: secs("REQUEST_TIMEOUT_SECS", defaults.request_timeout)?,
        })
    }

    pub fn profile_path(&self) -> PathBuf {
        self.data_root.join("profile.json")
    }

    pub fn profile_v2_path(&self) -> PathBuf {
        self.data_root.join("profile-v2.json")
    }

    pub fn website_stats_path(&self) -> PathBuf {
        self.data_root.join("website-stats.json")
    }
}
