//! Tracking runtime configuration

use std::io;
use tokio::runtime::Runtime;

const DEFAULT_WORKER_THREADS: usize = 16;

/// Configuration for the tracking worker pool.
#[derive(Debug, Clone)]
pub struct TrackingConfig {
    /// Number of worker threads executing search-pattern tasks and hit
    /// ingestion callbacks.
    ///
    /// Any task may block on storage I/O; one blocked worker does not
    /// stall the others, so this bounds parallelism only. More threads
    /// raise throughput under storage latency at the cost of memory and
    /// scheduler overhead; nothing else depends on the exact number.
    pub worker_threads: usize,
}

impl Default for TrackingConfig {
    fn default() -> Self {
        Self {
            worker_threads: DEFAULT_WORKER_THREADS,
        }
    }
}

impl TrackingConfig {
    /// Create a configuration from environment variables.
    ///
    /// Environment variables:
    /// - `SPYGLASS_TRACKING_WORKERS` (default: 16)
    pub fn from_env() -> Self {
        Self {
            worker_threads: std::env::var("SPYGLASS_TRACKING_WORKERS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(DEFAULT_WORKER_THREADS),
        }
    }

    /// Build the bounded multi-thread runtime all tracking work runs
    /// on. Owned by the process root and shared by every coordinator.
    pub fn build_runtime(&self) -> io::Result<Runtime> {
        tokio::runtime::Builder::new_multi_thread()
            .worker_threads(self.worker_threads)
            .thread_name("spyglass-tracking")
            .enable_all()
            .build()
    }
}
