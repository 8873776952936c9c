//! Background replenisher for the short-ID key pool.

use crate::db::Database;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

/// Unused-pool level that triggers replenishment.
pub const DEFAULT_MIN_KEYS: usize = 100;
/// Keys generated per replenishment round.
pub const DEFAULT_BATCH_SIZE: usize = 1000;
/// How often the pool level is checked.
pub const DEFAULT_CHECK_INTERVAL: Duration = Duration::from_secs(60);

#[derive(Debug, Clone)]
pub struct KeygenConfig {
    pub min_keys: usize,
    pub batch_size: usize,
    pub check_interval: Duration,
}

impl Default for KeygenConfig {
    fn default() -> Self {
        Self {
            min_keys: DEFAULT_MIN_KEYS,
            batch_size: DEFAULT_BATCH_SIZE,
            check_interval: DEFAULT_CHECK_INTERVAL,
        }
    }
}

pub struct KeygenWorker {
    db: Arc<Database>,
    config: KeygenConfig,
}

impl KeygenWorker {
    pub fn new(db: Arc<Database>, config: KeygenConfig) -> Self {
        Self { db, config }
    }

    /// Run until the shutdown signal flips. The first tick fires
    /// immediately, so the pool is checked once at startup.
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) {
        tracing::info!(
            "keygen worker started (min_keys: {}, batch: {}, interval: {:?})",
            self.config.min_keys,
            self.config.batch_size,
            self.config.check_interval
        );

        let mut ticker = tokio::time::interval(self.config.check_interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = shutdown.changed() => {
                    tracing::info!("keygen worker stopped");
                    return;
                }
                _ = ticker.tick() => self.check_and_replenish(),
            }
        }
    }

    /// Generation failures are logged and retried on the next tick; they
    /// never reach the request path.
    fn check_and_replenish(&self) {
        let unused = self.db.keys.count_unused();
        if unused >= self.config.min_keys {
            return;
        }

        tracing::info!(
            "unused keys ({}) below threshold ({}), generating more",
            unused,
            self.config.min_keys
        );

        match self.db.keys.generate(self.config.batch_size) {
            Ok(generated) => {
                tracing::info!(
                    "generated {} new keys, total unused: {}",
                    generated,
                    self.db.keys.count_unused()
                );
            }
            Err(err) => tracing::error!("key generation failed: {}", err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn replenishes_only_below_threshold() {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("test.db");
        let db = Arc::new(Database::new(db_path.to_str().unwrap()).unwrap());

        let worker = KeygenWorker::new(
            db.clone(),
            KeygenConfig {
                min_keys: 10,
                batch_size: 25,
                check_interval: Duration::from_secs(60),
            },
        );

        worker.check_and_replenish();
        let after_first = db.keys.count_unused();
        assert!(after_first >= 10, "pool was not refilled: {}", after_first);

        // Above the low-water mark nothing happens.
        worker.check_and_replenish();
        assert_eq!(db.keys.count_unused(), after_first);
    }

    #[tokio::test]
    async fn stops_on_shutdown_signal() {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("test.db");
        let db = Arc::new(Database::new(db_path.to_str().unwrap()).unwrap());

        let worker = KeygenWorker::new(db, KeygenConfig::default());
        let (tx, rx) = watch::channel(false);
        let handle = tokio::spawn(worker.run(rx));

        tx.send(true).unwrap();
        tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .expect("worker did not stop")
            .unwrap();
    }
}
