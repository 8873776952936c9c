pub mod blob;
pub mod keys;
pub mod paste;

use crate::error::AppError;
use sled::Db;
use std::sync::Arc;

pub struct Database {
    db: Arc<Db>,
    pub pastes: paste::PasteDb,
    pub keys: keys::KeyDb,
    pub blobs: blob::BlobDb,
}

#[cfg(test)]
mod tests;

impl Database {
    pub fn new(path: &str) -> Result<Self, AppError> {
        // Ensure the data directory exists
        if let Some(parent) = std::path::Path::new(path).parent() {
            std::fs::create_dir_all(parent).ok();
        }

        // Open database - sled handles concurrent access properly
        let db = Arc::new(sled::open(path)?);

        Ok(Self {
            pastes: paste::PasteDb::new(db.clone())?,
            keys: keys::KeyDb::new(db.clone())?,
            blobs: blob::BlobDb::new(db.clone())?,
            db,
        })
    }

    /// Flush all pending writes to disk
    pub fn flush(&self) -> Result<(), AppError> {
        self.db.flush()?;
        Ok(())
    }
}
