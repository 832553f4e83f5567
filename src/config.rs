//! Configuration: TOML file loading, overrides, and defaults.
//!
//! Resolution order (first found wins, values merge/override):
//! 1. Caller-supplied overrides
//! 2. `$OUTPUT_EXPLORER_CONFIG` environment variable (path to config file)
//! 3. Project-local `.output-explorer.toml` in the current working directory
//! 4. Global `~/.config/output-explorer/config.toml`
//! 5. Built-in defaults

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

/// Polling settings.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct PollerSection {
    /// Interval between status fetches for one job, in milliseconds.
    pub interval_ms: Option<u64>,
    /// Multiplier applied to the interval after each in-progress fetch.
    /// 1.0 keeps the interval fixed.
    pub backoff_factor: Option<f64>,
    /// Upper bound on the (possibly backed-off) interval, in milliseconds.
    pub max_interval_ms: Option<u64>,
}

/// Top-level configuration.
///
/// All fields are optional so partial configs from different sources can be
/// merged (overrides beat files, files beat defaults).
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct ExplorerConfig {
    pub poller: PollerSection,
}

/// Default poll interval (2 seconds).
pub const DEFAULT_INTERVAL_MS: u64 = 2_000;
/// Default backoff factor (fixed interval).
pub const DEFAULT_BACKOFF_FACTOR: f64 = 1.0;
/// Default interval cap (30 seconds).
pub const DEFAULT_MAX_INTERVAL_MS: u64 = 30_000;

/// Snapshot of the effective polling settings handed to the poller.
#[derive(Debug, Clone, Copy)]
pub struct PollerConfig {
    pub interval: Duration,
    pub backoff_factor: f64,
    pub max_interval: Duration,
}

impl Default for PollerConfig {
    fn default() -> Self {
        ExplorerConfig::default().poller_config()
    }
}

/// Candidate config file paths in priority order.
fn candidate_paths() -> Vec<PathBuf> {
    let mut paths = Vec::new();

    if let Ok(env_path) = std::env::var("OUTPUT_EXPLORER_CONFIG") {
        paths.push(PathBuf::from(env_path));
    }

    if let Ok(cwd) = std::env::current_dir() {
        paths.push(cwd.join(".output-explorer.toml"));
    }

    if let Some(config_dir) = dirs::config_dir() {
        paths.push(config_dir.join("output-explorer").join("config.toml"));
    }

    paths
}

/// Try to read and parse a TOML config file. Returns `None` if the file
/// doesn't exist or can't be parsed (the parse failure is logged).
fn load_file(path: &Path) -> Option<ExplorerConfig> {
    let content = std::fs::read_to_string(path).ok()?;
    match toml::from_str::<ExplorerConfig>(&content) {
        Ok(cfg) => Some(cfg),
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "failed to parse config file");
            None
        }
    }
}

impl ExplorerConfig {
    /// Merge `other` on top of `self` — `other`'s `Some` values win.
    pub fn merge(self, other: &ExplorerConfig) -> ExplorerConfig {
        ExplorerConfig {
            poller: PollerSection {
                interval_ms: other.poller.interval_ms.or(self.poller.interval_ms),
                backoff_factor: other.poller.backoff_factor.or(self.poller.backoff_factor),
                max_interval_ms: other
                    .poller
                    .max_interval_ms
                    .or(self.poller.max_interval_ms),
            },
        }
    }

    /// Load the final merged configuration.
    ///
    /// `explicit_path` is an explicit config file location; `overrides` are
    /// partial overrides from the embedding application.
    pub fn load(explicit_path: Option<&Path>, overrides: Option<&ExplorerConfig>) -> ExplorerConfig {
        let mut config = ExplorerConfig::default();

        // Lowest priority first so higher overwrites.
        for path in candidate_paths().iter().rev() {
            if let Some(file_cfg) = load_file(path) {
                config = config.merge(&file_cfg);
            }
        }

        if let Some(path) = explicit_path {
            if let Some(file_cfg) = load_file(path) {
                config = config.merge(&file_cfg);
            }
        }

        if let Some(overrides) = overrides {
            config = config.merge(overrides);
        }

        config
    }

    /// Poll interval between status fetches.
    pub fn interval_ms(&self) -> u64 {
        self.poller.interval_ms.unwrap_or(DEFAULT_INTERVAL_MS)
    }

    /// Backoff multiplier per in-progress fetch (1.0 = fixed interval).
    pub fn backoff_factor(&self) -> f64 {
        let factor = self
            .poller
            .backoff_factor
            .unwrap_or(DEFAULT_BACKOFF_FACTOR);
        // The interval must never shrink or go non-finite.
        if factor.is_finite() && factor >= 1.0 {
            factor
        } else {
            DEFAULT_BACKOFF_FACTOR
        }
    }

    /// Cap on the backed-off interval.
    pub fn max_interval_ms(&self) -> u64 {
        self.poller
            .max_interval_ms
            .unwrap_or(DEFAULT_MAX_INTERVAL_MS)
            .max(self.interval_ms())
    }

    /// Effective poller settings.
    pub fn poller_config(&self) -> PollerConfig {
        PollerConfig {
            interval: Duration::from_millis(self.interval_ms()),
            backoff_factor: self.backoff_factor(),
            max_interval: Duration::from_millis(self.max_interval_ms()),
        }
    }
}
