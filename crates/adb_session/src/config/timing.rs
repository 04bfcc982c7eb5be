//! Timing configuration for session operations

use lazy_static::lazy_static;
use std::env;

fn env_f64(name: &str, default: f64) -> f64 {
    env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn env_u64(name: &str, default: u64) -> u64 {
    env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

/// Snapshot acquisition timing
#[derive(Debug, Clone)]
pub struct SnapshotTimingConfig {
    /// Rounds of dump + pull + parse before giving up
    pub attempts: u64,
    /// Delay between failed rounds, in seconds
    pub retry_delay: f64,
}

impl Default for SnapshotTimingConfig {
    fn default() -> Self {
        Self {
            attempts: env_u64("ADB_SESSION_SNAPSHOT_ATTEMPTS", 3),
            retry_delay: env_f64("ADB_SESSION_SNAPSHOT_RETRY_DELAY", 0.7),
        }
    }
}

/// Text input timing
#[derive(Debug, Clone)]
pub struct InputTimingConfig {
    /// Delay between chunks of slow text entry, in seconds
    pub inter_chunk_delay: f64,
    /// Characters per chunk for slow text entry
    pub chunk_size: u64,
}

impl Default for InputTimingConfig {
    fn default() -> Self {
        Self {
            inter_chunk_delay: env_f64("ADB_SESSION_INTER_CHUNK_DELAY", 0.1),
            chunk_size: env_u64("ADB_SESSION_CHUNK_SIZE", 2),
        }
    }
}

/// App lifecycle timing
#[derive(Debug, Clone)]
pub struct LifecycleTimingConfig {
    /// Install attempts before failing
    pub install_attempts: u64,
    /// Delay between install attempts, in seconds
    pub install_poll_interval: f64,
    /// Per-attempt install command timeout, in seconds
    pub install_timeout: u64,
    /// Uninstall / clear-data command timeout, in seconds
    pub uninstall_timeout: u64,
    /// Permission grant command timeout, in seconds
    pub grant_timeout: u64,
}

impl Default for LifecycleTimingConfig {
    fn default() -> Self {
        Self {
            install_attempts: env_u64("ADB_SESSION_INSTALL_ATTEMPTS", 7),
            install_poll_interval: env_f64("ADB_SESSION_INSTALL_POLL_INTERVAL", 0.5),
            install_timeout: env_u64("ADB_SESSION_INSTALL_TIMEOUT", 60),
            uninstall_timeout: env_u64("ADB_SESSION_UNINSTALL_TIMEOUT", 50),
            grant_timeout: env_u64("ADB_SESSION_GRANT_TIMEOUT", 20),
        }
    }
}

/// Master timing configuration
#[derive(Debug, Clone, Default)]
pub struct TimingConfig {
    pub snapshot: SnapshotTimingConfig,
    pub input: InputTimingConfig,
    pub lifecycle: LifecycleTimingConfig,
}

lazy_static! {
    /// Global timing configuration instance
    pub static ref TIMING_CONFIG: TimingConfig = TimingConfig::default();
}
