use crate::{error::AppError, models::paste::Paste};
use chrono::{DateTime, Utc};
use sled::Db;
use std::sync::Arc;

/// Metadata index for paste records, keyed by short ID. A secondary tree
/// keyed by expiry instant serves the reaper's range queries.
pub struct PasteDb {
    tree: sled::Tree,
    expiry: sled::Tree,
}

impl PasteDb {
    pub fn new(db: Arc<Db>) -> Result<Self, AppError> {
        let tree = db.open_tree("pastes")?;
        let expiry = db.open_tree("paste_expiry")?;
        Ok(Self { tree, expiry })
    }

    /// Insert a new record. The short ID must be unused; a second insert
    /// under the same ID fails with `Duplicate`.
    pub fn create(&self, paste: &Paste) -> Result<(), AppError> {
        let value = bincode::serialize(paste)?;
        self.tree
            .compare_and_swap(paste.short_id.as_bytes(), None as Option<&[u8]>, Some(value))?
            .map_err(|_| AppError::Duplicate)?;

        if let Some(expires_at) = paste.expires_at {
            self.expiry
                .insert(expiry_key(expires_at, &paste.short_id), &[])?;
        }

        Ok(())
    }

    pub fn get(&self, short_id: &str) -> Result<Option<Paste>, AppError> {
        Ok(self
            .tree
            .get(short_id.as_bytes())?
            .map(|v| bincode::deserialize(&v))
            .transpose()?)
    }

    /// Remove a record and its expiry index entry. Returns whether a record
    /// was present.
    pub fn delete(&self, short_id: &str) -> Result<bool, AppError> {
        let removed = self.tree.remove(short_id.as_bytes())?;
        if let Some(bytes) = &removed {
            let paste: Paste = bincode::deserialize(bytes)?;
            if let Some(expires_at) = paste.expires_at {
                self.expiry.remove(expiry_key(expires_at, short_id))?;
            }
        }
        Ok(removed.is_some())
    }

    /// Remove several records; returns how many were actually present.
    pub fn delete_many(&self, short_ids: &[String]) -> Result<u64, AppError> {
        let mut deleted = 0;
        for short_id in short_ids {
            if self.delete(short_id)? {
                deleted += 1;
            }
        }
        Ok(deleted)
    }

    /// Return at most `limit` records whose `expires_at` is strictly in the
    /// past. Index entries whose record is already gone are scrubbed on the
    /// way through.
    pub fn get_expired_batch(&self, limit: usize) -> Result<Vec<Paste>, AppError> {
        let cutoff = now_prefix();
        let mut batch = Vec::new();

        for item in self.expiry.range(..cutoff) {
            let (key, _) = item?;
            match self.tree.get(&key[8..])? {
                Some(bytes) => {
                    batch.push(bincode::deserialize::<Paste>(&bytes)?);
                    if batch.len() >= limit {
                        break;
                    }
                }
                None => {
                    // Stale index entry left behind by an out-of-band delete.
                    self.expiry.remove(&key)?;
                }
            }
        }

        Ok(batch)
    }

    pub fn count_expired(&self) -> Result<u64, AppError> {
        let cutoff = now_prefix();
        let mut count = 0;

        for item in self.expiry.range(..cutoff) {
            let (key, _) = item?;
            if self.tree.contains_key(&key[8..])? {
                count += 1;
            }
        }

        Ok(count)
    }
}

// Expiry index keys sort by instant first: 8 big-endian millisecond bytes
// followed by the short ID, so records sharing an instant stay distinct.
fn expiry_key(expires_at: DateTime<Utc>, short_id: &str) -> Vec<u8> {
    let millis = expires_at.timestamp_millis().max(0) as u64;
    let mut key = Vec::with_capacity(8 + short_id.len());
    key.extend_from_slice(&millis.to_be_bytes());
    key.extend_from_slice(short_id.as_bytes());
    key
}

fn now_prefix() -> [u8; 8] {
    (Utc::now().timestamp_millis().max(0) as u64).to_be_bytes()
}
