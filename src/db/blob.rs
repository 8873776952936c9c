//! Blob store adapter: gzip-compressed paste bodies under deterministic keys.

use crate::error::AppError;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use sled::Db;
use std::io::{Read, Write};
use std::sync::Arc;

/// Prefix for all paste content keys.
const KEY_PREFIX: &str = "gisty/";
/// Suffix marking gzip-compressed bodies.
const KEY_SUFFIX: &str = ".gz";

pub struct BlobDb {
    tree: sled::Tree,
}

impl BlobDb {
    pub fn new(db: Arc<Db>) -> Result<Self, AppError> {
        let tree = db.open_tree("blobs")?;
        Ok(Self { tree })
    }

    /// Deterministic locator for a paste's content.
    pub fn content_key(short_id: &str) -> String {
        format!("{}{}{}", KEY_PREFIX, short_id, KEY_SUFFIX)
    }

    /// Compress and store content under the short ID's content key. The put
    /// is idempotent; a re-write replaces the previous body.
    pub fn put(&self, short_id: &str, content: &str) -> Result<(), AppError> {
        let compressed = compress(content)?;
        self.tree
            .insert(Self::content_key(short_id).as_bytes(), compressed)
            .map_err(classify)?;
        Ok(())
    }

    pub fn get(&self, short_id: &str) -> Result<String, AppError> {
        let bytes = self
            .tree
            .get(Self::content_key(short_id).as_bytes())
            .map_err(classify)?
            .ok_or(AppError::ContentNotFound)?;
        decompress(&bytes)
    }

    /// Idempotent delete; removing an absent blob is not an error.
    pub fn delete(&self, short_id: &str) -> Result<(), AppError> {
        self.tree
            .remove(Self::content_key(short_id).as_bytes())
            .map_err(classify)?;
        Ok(())
    }

    pub fn exists(&self, short_id: &str) -> Result<bool, AppError> {
        self.tree
            .contains_key(Self::content_key(short_id).as_bytes())
            .map_err(classify)
    }
}

// Permission-class I/O failures surface as AccessDenied; anything else stays
// a transient backend error.
fn classify(err: sled::Error) -> AppError {
    if let sled::Error::Io(io) = &err {
        if io.kind() == std::io::ErrorKind::PermissionDenied {
            return AppError::AccessDenied;
        }
    }
    AppError::Database(err)
}

pub fn compress(content: &str) -> Result<Vec<u8>, AppError> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(content.as_bytes())?;
    Ok(encoder.finish()?)
}

pub fn decompress(compressed: &[u8]) -> Result<String, AppError> {
    let mut decoder = GzDecoder::new(compressed);
    let mut content = String::new();
    decoder.read_to_string(&mut content)?;
    Ok(content)
}
