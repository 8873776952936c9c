//! Periodic reclamation of expired pastes across all three tiers.

use crate::{cache::Cache, db::Database};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

/// Default time between sweeps.
pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(5 * 60);
/// Default number of records handled per batch.
pub const DEFAULT_BATCH_SIZE: usize = 100;

#[derive(Debug, Clone)]
pub struct ReaperConfig {
    pub interval: Duration,
    pub batch_size: usize,
}

impl Default for ReaperConfig {
    fn default() -> Self {
        Self {
            interval: DEFAULT_INTERVAL,
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }
}

pub struct Reaper {
    db: Arc<Database>,
    cache: Arc<Cache>,
    config: ReaperConfig,
}

impl Reaper {
    pub fn new(db: Arc<Database>, cache: Arc<Cache>, config: ReaperConfig) -> Self {
        Self { db, cache, config }
    }

    /// Run until the shutdown signal flips. The first tick fires
    /// immediately, so anything missed while the server was down is swept at
    /// startup.
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) {
        tracing::info!(
            "reaper started (interval: {:?}, batch_size: {})",
            self.config.interval,
            self.config.batch_size
        );

        let mut ticker = tokio::time::interval(self.config.interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = shutdown.changed() => {
                    tracing::info!("reaper stopped");
                    return;
                }
                _ = ticker.tick() => {
                    self.run_cleanup();
                }
            }
        }
    }

    /// One sweep: drain expired records in bounded batches, deleting from
    /// cache, then blobs, then metadata. Cache and blob errors are ignored;
    /// a metadata failure aborts the cycle (next tick retries).
    pub fn run_cleanup(&self) -> u64 {
        let mut total_cleaned = 0;

        loop {
            let batch = match self.db.pastes.get_expired_batch(self.config.batch_size) {
                Ok(batch) => batch,
                Err(err) => {
                    tracing::error!("reaper: failed to fetch expired pastes: {}", err);
                    break;
                }
            };

            if batch.is_empty() {
                break;
            }

            let short_ids: Vec<String> =
                batch.iter().map(|paste| paste.short_id.clone()).collect();

            for short_id in &short_ids {
                self.cache.delete(short_id);
            }

            for short_id in &short_ids {
                if let Err(err) = self.db.blobs.delete(short_id) {
                    tracing::debug!("reaper: blob delete failed for {}: {}", short_id, err);
                }
            }

            match self.db.pastes.delete_many(&short_ids) {
                Ok(deleted) => total_cleaned += deleted,
                Err(err) => {
                    tracing::error!("reaper: metadata delete failed: {}", err);
                    break;
                }
            }

            if batch.len() < self.config.batch_size {
                break;
            }
        }

        if total_cleaned > 0 {
            tracing::info!("reaper: cleaned up {} expired pastes", total_cleaned);
        }

        total_cleaned
    }
}
