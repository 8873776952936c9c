//! Storage for the pre-generated short-ID pool.

use crate::{base62, error::AppError};
use chrono::{DateTime, Utc};
use rand::{rngs::OsRng, Rng};
use serde::{Deserialize, Serialize};
use sled::Db;
use std::sync::Arc;

/// Length of generated short IDs.
pub const KEY_LENGTH: usize = 6;

// 62^6. Collisions stay negligible well past a million issued keys.
const KEYSPACE: u64 = 56_800_235_584;

#[derive(Debug, Serialize, Deserialize)]
struct KeyRecord {
    created_at: DateTime<Utc>,
    used_at: Option<DateTime<Utc>>,
}

/// The unused pool and the used ledger. Claiming a key moves its record from
/// one tree to the other; records are never dropped.
pub struct KeyDb {
    unused: sled::Tree,
    used: sled::Tree,
}

impl KeyDb {
    pub fn new(db: Arc<Db>) -> Result<Self, AppError> {
        Ok(Self {
            unused: db.open_tree("keys_unused")?,
            used: db.open_tree("keys_used")?,
        })
    }

    /// Atomically claim an unused key. `pop_min` guarantees no two callers
    /// can receive the same key. Fails with `NoKeysAvailable` on an empty
    /// pool.
    pub fn reserve(&self) -> Result<String, AppError> {
        let (key, value) = match self.unused.pop_min()? {
            Some(entry) => entry,
            None => return Err(AppError::NoKeysAvailable),
        };

        let mut record: KeyRecord = bincode::deserialize(&value)?;
        record.used_at = Some(Utc::now());
        self.used.insert(&key, bincode::serialize(&record)?)?;

        Ok(String::from_utf8_lossy(&key).into_owned())
    }

    /// Insert up to `count` fresh random keys, silently skipping collisions,
    /// with at most `3 * count` attempts. Returns how many were actually
    /// inserted.
    pub fn generate(&self, count: usize) -> Result<usize, AppError> {
        if count == 0 {
            return Ok(0);
        }

        let mut generated = 0;
        let max_attempts = count * 3;

        for _ in 0..max_attempts {
            if generated >= count {
                break;
            }

            let key = random_key();
            if self.used.contains_key(key.as_bytes())? {
                continue;
            }

            let record = bincode::serialize(&KeyRecord {
                created_at: Utc::now(),
                used_at: None,
            })?;
            if self
                .unused
                .compare_and_swap(key.as_bytes(), None as Option<&[u8]>, Some(record))?
                .is_ok()
            {
                generated += 1;
            }
        }

        Ok(generated)
    }

    pub fn count_unused(&self) -> usize {
        self.unused.len()
    }

    pub fn count_total(&self) -> usize {
        self.unused.len() + self.used.len()
    }
}

/// Sample a uniform value in `[0, 62^KEY_LENGTH)` from the OS entropy source
/// and left-pad the encoding with the alphabet's zero character to exactly
/// `KEY_LENGTH`.
fn random_key() -> String {
    let n = OsRng.gen_range(0..KEYSPACE);
    format!("{:0>width$}", base62::encode(n), width = KEY_LENGTH)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn random_keys_have_fixed_length_and_alphabet() {
        for _ in 0..100 {
            let key = random_key();
            assert_eq!(key.len(), KEY_LENGTH);
            assert!(key.bytes().all(|b| base62::ALPHABET.contains(&b)), "{}", key);
        }
    }
}
