//! Worker configuration.

use std::path::PathBuf;
use std::time::Duration;

fn env_u64(name: &str, default: u64) -> u64 {
    std::env::var(name)
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(default)
}

fn env_usize(name: &str, default: usize) -> usize {
    std::env::var(name)
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(default)
}

/// Worker configuration.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// Worker slots for the default queue
    pub default_workers: usize,
    /// Worker slots for the archive (download/move) queue
    pub archive_workers: usize,
    /// Worker slots for the post-processing queue
    pub postprocess_workers: usize,
    /// Worker slots for the chat-render queue
    pub chat_render_workers: usize,
    /// Interval between watchdog health checks
    pub health_check_interval: Duration,
    /// Interval between watched-channel polls
    pub check_channels_interval: Duration,
    /// Interval between chapter/muted-segment backfill runs
    pub backfill_interval: Duration,
    /// Interval between live-to-VOD identity reconciliation runs
    pub reconcile_interval: Duration,
    /// Fixed delay between videos inside a reconciliation batch
    pub item_delay: Duration,
    /// Fixed delay between chat export pages
    pub chat_page_delay: Duration,
    /// Staging directory for in-flight downloads
    pub staging_dir: PathBuf,
    /// Final archive directory
    pub archive_dir: PathBuf,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            default_workers: 2,
            archive_workers: 2,
            postprocess_workers: 1,
            chat_render_workers: 1,
            health_check_interval: Duration::from_secs(60),
            check_channels_interval: Duration::from_secs(300),
            backfill_interval: Duration::from_secs(3600),
            reconcile_interval: Duration::from_secs(1800),
            item_delay: Duration::from_secs(2),
            chat_page_delay: Duration::from_millis(500),
            staging_dir: PathBuf::from("/tmp/vodarc/staging"),
            archive_dir: PathBuf::from("/var/lib/vodarc/archive"),
        }
    }
}

impl WorkerConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        Self {
            default_workers: env_usize("VODARC_DEFAULT_WORKERS", 2),
            archive_workers: env_usize("VODARC_ARCHIVE_WORKERS", 2),
            postprocess_workers: env_usize("VODARC_POSTPROCESS_WORKERS", 1),
            chat_render_workers: env_usize("VODARC_CHAT_RENDER_WORKERS", 1),
            health_check_interval: Duration::from_secs(env_u64(
                "VODARC_HEALTH_CHECK_INTERVAL_SECS",
                60,
            )),
            check_channels_interval: Duration::from_secs(env_u64(
                "VODARC_CHECK_CHANNELS_INTERVAL_SECS",
                300,
            )),
            backfill_interval: Duration::from_secs(env_u64(
                "VODARC_BACKFILL_INTERVAL_SECS",
                3600,
            )),
            reconcile_interval: Duration::from_secs(env_u64(
                "VODARC_RECONCILE_INTERVAL_SECS",
                1800,
            )),
            item_delay: Duration::from_millis(env_u64("VODARC_ITEM_DELAY_MS", 2000)),
            chat_page_delay: Duration::from_millis(env_u64("VODARC_CHAT_PAGE_DELAY_MS", 500)),
            staging_dir: std::env::var("VODARC_STAGING_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("/tmp/vodarc/staging")),
            archive_dir: std::env::var("VODARC_ARCHIVE_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("/var/lib/vodarc/archive")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use serial_test::serial;

    #[test]
    #[serial]
    fn from_env_parses_overrides() {
        std::env::set_var("VODARC_ARCHIVE_WORKERS", "4");
        std::env::set_var("VODARC_CHECK_CHANNELS_INTERVAL_SECS", "120");
        std::env::set_var("VODARC_STAGING_DIR", "/data/staging");

        let config = WorkerConfig::from_env();
        assert_eq!(config.archive_workers, 4);
        assert_eq!(config.check_channels_interval, Duration::from_secs(120));
        assert_eq!(config.staging_dir, PathBuf::from("/data/staging"));

        std::env::remove_var("VODARC_ARCHIVE_WORKERS");
        std::env::remove_var("VODARC_CHECK_CHANNELS_INTERVAL_SECS");
        std::env::remove_var("VODARC_STAGING_DIR");
    }

    #[test]
    #[serial]
    fn from_env_ignores_invalid_values() {
        std::env::set_var("VODARC_POSTPROCESS_WORKERS", "not-a-number");

        let config = WorkerConfig::from_env();
        assert_eq!(config.postprocess_workers, 1);

        std::env::remove_var("VODARC_POSTPROCESS_WORKERS");
    }
}
